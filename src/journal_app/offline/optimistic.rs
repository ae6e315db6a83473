//! # Optimistic Mutations
//!
//! Every user-initiated write goes through the same three steps:
//!
//! 1. Apply the change to the local trade collection immediately. It is never
//!    rolled back; reconciliation settles it later.
//! 2. When the connectivity signal says online, try the API call directly.
//! 3. When offline, or when the direct call fails for any reason, enqueue the
//!    operation for replay.
//!
//! "Online" is only a hint. A direct call that fails still ends up queued.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tradejournal_sync::journal_app::api_client::HttpTransport;
//! use tradejournal_sync::journal_app::config::Config;
//! use tradejournal_sync::journal_app::local_db::MemoryStore;
//! use tradejournal_sync::journal_app::offline::{OfflineQueue, OptimisticCoordinator};
//! use tradejournal_sync::journal_app::state::TradeCollection;
//! use tradejournal_sync::journal_app::sync::network_monitor::ConnectivitySignal;
//! use tradejournal_sync::shared::{Direction, Trade};
//!
//! # async fn example() -> tradejournal_sync::journal_app::error::Result<()> {
//! let api = Arc::new(HttpTransport::new(Config::new()));
//! let queue = Arc::new(OfflineQueue::new(
//!     Arc::new(MemoryStore::new()),
//!     api.clone(),
//!     ConnectivitySignal::default(),
//! ));
//! let coordinator = OptimisticCoordinator::new(queue, api, TradeCollection::with_samples());
//!
//! let trade = Trade::open("user1", "EURUSD", Direction::Long, 1.085, 10_000.0, 6);
//! let path = coordinator.create_trade(trade).await?;
//! println!("persisted via {:?}", path);
//! # Ok(())
//! # }
//! ```

use crate::journal_app::api_client::{TradeSource, Transport};
use crate::journal_app::error::Result;
use crate::journal_app::offline::queue::{OfflineQueue, Operation};
use crate::journal_app::offline::reconciliation::{LocalWins, MergeStrategy};
use crate::journal_app::state::TradeCollection;
use crate::shared::{SharedError, Trade, TradeUpdate};
use serde_json::json;
use std::sync::Arc;

/// How a mutation reached (or will reach) the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPath {
    /// The direct API call succeeded
    Direct,
    /// The operation is waiting in the offline queue
    Queued,
}

pub struct OptimisticCoordinator {
    queue: Arc<OfflineQueue>,
    transport: Arc<dyn Transport>,
    source: Arc<dyn TradeSource>,
    trades: TradeCollection,
    strategy: Box<dyn MergeStrategy<Trade>>,
}

impl OptimisticCoordinator {
    pub fn new<A>(queue: Arc<OfflineQueue>, api: Arc<A>, trades: TradeCollection) -> Self
    where
        A: Transport + TradeSource + 'static,
    {
        Self {
            queue,
            transport: api.clone(),
            source: api,
            trades,
            strategy: Box::new(LocalWins),
        }
    }

    /// Replace the merge strategy used by `refresh_from_server`
    pub fn with_strategy(mut self, strategy: impl MergeStrategy<Trade> + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn trades(&self) -> &TradeCollection {
        &self.trades
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// Deliver directly when possible, queue otherwise
    async fn persist(&self, operation: Operation) -> Result<MutationPath> {
        operation.validate()?;

        if self.queue.connectivity().is_online() {
            let result = self
                .transport
                .send(
                    operation.kind.method(),
                    &operation.endpoint,
                    operation.body(),
                )
                .await;
            match result {
                Ok(status) if (200..300).contains(&status) => {
                    tracing::debug!("{:?} {} delivered directly", operation.kind, operation.endpoint);
                    return Ok(MutationPath::Direct);
                }
                Ok(status) => tracing::warn!(
                    "{:?} {} returned {}, queueing for retry",
                    operation.kind,
                    operation.endpoint,
                    status
                ),
                Err(e) => tracing::warn!(
                    "{:?} {} failed: {}, queueing for retry",
                    operation.kind,
                    operation.endpoint,
                    e
                ),
            }
        }

        self.queue.enqueue(operation).await?;
        Ok(MutationPath::Queued)
    }

    /// Add a trade locally and POST it to `/trades`
    pub async fn create_trade(&self, trade: Trade) -> Result<MutationPath> {
        let operation = Operation::create("/trades", &trade)?;
        self.trades.add(trade).await;
        self.persist(operation).await
    }

    /// Create each trade in order (CSV import)
    pub async fn import_trades(&self, trades: Vec<Trade>) -> Result<Vec<MutationPath>> {
        let mut paths = Vec::with_capacity(trades.len());
        for trade in trades {
            paths.push(self.create_trade(trade).await?);
        }
        tracing::info!("Imported {} trades", paths.len());
        Ok(paths)
    }

    /// Patch a trade locally and PUT the patch to `/trades/{id}`
    pub async fn update_trade(&self, id: &str, update: TradeUpdate) -> Result<MutationPath> {
        if self.trades.update(id, &update).await.is_none() {
            tracing::warn!("Updating trade {} that is not in the local collection", id);
        }
        let operation = Operation::update(format!("/trades/{}", id), &update)?;
        self.persist(operation).await
    }

    /// Record the post-exit journal and POST it to `/trades/{id}/journal`
    pub async fn add_journal_entry(&self, id: &str, journal: impl Into<String>) -> Result<MutationPath> {
        let journal = journal.into();
        let update = TradeUpdate {
            post_exit_journal: Some(journal.clone()),
            ..TradeUpdate::default()
        };
        self.trades.update(id, &update).await;

        let operation = Operation::create(
            format!("/trades/{}/journal", id),
            &json!({ "journal": journal }),
        )?;
        self.persist(operation).await
    }

    /// Append a screenshot URL and PUT the full list to `/trades/{id}`
    pub async fn attach_screenshot(&self, id: &str, url: impl Into<String>) -> Result<MutationPath> {
        let trade = self
            .trades
            .get(id)
            .await
            .ok_or_else(|| SharedError::unknown_trade(id))?;

        let mut screenshots = trade.screenshots.unwrap_or_default();
        screenshots.push(url.into());
        self.update_trade(
            id,
            TradeUpdate {
                screenshots: Some(screenshots),
                ..TradeUpdate::default()
            },
        )
        .await
    }

    /// Remove a trade locally and DELETE `/trades/{id}`
    pub async fn delete_trade(&self, id: &str) -> Result<MutationPath> {
        self.trades.remove(id).await;
        self.persist(Operation::delete(format!("/trades/{}", id))).await
    }

    /// Wipe the offline records and the local collection
    pub async fn delete_all_data(&self) -> Result<()> {
        self.queue.clear_cache().await?;
        self.trades.clear().await;
        tracing::info!("Deleted all local data");
        Ok(())
    }

    /// Fetch the server's trades and merge them into the local collection
    pub async fn refresh_from_server(&self) -> Result<usize> {
        let remote = self.source.fetch_trades().await?;
        self.trades.sync(&remote, self.strategy.as_ref()).await;
        let total = self.trades.len().await;
        tracing::info!("Refreshed {} remote trades, {} in collection", remote.len(), total);
        Ok(total)
    }
}
