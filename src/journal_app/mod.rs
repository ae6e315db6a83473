//! Journal Sync Client Module
//!
//! Client-side runtime of the trading journal's offline write path.
//!
//! # Architecture
//!
//! - **`config`** - Configuration (server URL, token, store path, retry policy)
//! - **`error`** - `SyncError`, returned by every fallible client operation
//! - **`local_db`** - Durable key/value store backing the queue and caches
//! - **`api_client`** - HTTP transport and trade fetches
//! - **`offline`** - Queue manager, retry policy, optimistic mutations, reconciliation
//! - **`sync`** - Connectivity monitoring and background status polling
//! - **`state`** - In-memory trade collection
//! - **`main`** - `journal_sync` binary
//!
//! # Module Structure
//!
//! ```text
//! journal_app/
//! ├── mod.rs
//! ├── main.rs
//! ├── config.rs
//! ├── error.rs
//! ├── api_client.rs
//! ├── local_db/   - DurableStore, SqliteStore, MemoryStore, schema
//! ├── offline/    - queue, retry, optimistic, reconciliation
//! ├── sync/       - network_monitor, scheduler, sync_state
//! └── state/      - TradeCollection
//! ```

pub mod api_client;
pub mod config;
pub mod error;
pub mod local_db;
pub mod offline;
pub mod state;
pub mod sync;

// Re-export commonly used types
pub use api_client::{HttpTransport, TradeSource, Transport, TransportError};
pub use config::Config;
pub use error::SyncError;
pub use local_db::{DurableStore, MemoryStore, SqliteStore, StoreError};
pub use offline::{MutationPath, OfflineQueue, OptimisticCoordinator};
pub use state::TradeCollection;
pub use sync::{ConnectivitySignal, NetworkStatus, SyncService, SyncState};
