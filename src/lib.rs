//! Trade Journal Sync - Main Library
//!
//! Offline write durability for a trading journal client. User edits are
//! applied locally at once, delivered to the journal API when it is reachable,
//! and otherwise persisted in a durable queue that is replayed when
//! connectivity returns.
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic types
//!   - Trade record, partial updates, P/L arithmetic
//!   - Application configuration
//!   - Error types
//!
//! - **`journal_app`** - Client runtime
//!   - Durable key/value store (SQLite or in-memory)
//!   - Offline queue with bounded, classified retries
//!   - Optimistic mutation coordinator
//!   - Remote/local reconciliation with pluggable merge strategies
//!   - Connectivity monitor and status poller
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tradejournal_sync::journal_app::{
//!     Config, ConnectivitySignal, HttpTransport, OfflineQueue, OptimisticCoordinator,
//!     SqliteStore, TradeCollection,
//! };
//! use tradejournal_sync::shared::{Direction, Trade};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let store = Arc::new(SqliteStore::open(config.store_path()).await?);
//! let api = Arc::new(HttpTransport::new(config));
//! let queue = Arc::new(OfflineQueue::new(store, api.clone(), ConnectivitySignal::default()));
//!
//! let coordinator = OptimisticCoordinator::new(queue, api, TradeCollection::with_samples());
//! coordinator
//!     .create_trade(Trade::open("user1", "EURUSD", Direction::Long, 1.085, 10_000.0, 7))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Queue read-modify-write cycles are serialized by a mutex inside
//! `OfflineQueue`, and at most one flush runs at a time. The durable store
//! assumes a single writing process.
//!
//! # Error Handling
//!
//! - `shared::SharedError` for validation and serialization
//! - `journal_app::SyncError` for everything the client runtime returns
//!
//! Network failures during replay are never returned as errors; they are
//! recorded as retries on the queued item.

/// Shared types and data structures
pub mod shared;

/// Offline sync client
pub mod journal_app;
