//! # Offline Queue
//!
//! Durable FIFO of write operations that could not be delivered, replayed
//! against the journal API when connectivity returns.
//!
//! ## Features
//!
//! - **Persistent Queue**: items live in the durable store under `offline_queue`
//!   and survive restarts
//! - **Ordered Replay**: a flush delivers items oldest first, one at a time
//! - **Bounded Retries**: failures bump a per-item counter; the item is dropped
//!   at the retry ceiling
//! - **Single Flight**: a flush requested while another is running is skipped
//! - **Trade Cache**: last-known trades stored next to the queue
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tradejournal_sync::journal_app::local_db::MemoryStore;
//! use tradejournal_sync::journal_app::offline::queue::{OfflineQueue, Operation};
//! use tradejournal_sync::journal_app::sync::network_monitor::ConnectivitySignal;
//! # use tradejournal_sync::journal_app::api_client::HttpTransport;
//! # use tradejournal_sync::journal_app::config::Config;
//!
//! # async fn example() -> tradejournal_sync::journal_app::error::Result<()> {
//! let transport = Arc::new(HttpTransport::new(Config::new()));
//! let queue = OfflineQueue::new(Arc::new(MemoryStore::new()), transport, ConnectivitySignal::default());
//!
//! queue.enqueue(Operation::delete("/trades/t1")).await?;
//! let outcome = queue.flush_queue().await?;
//! # Ok(())
//! # }
//! ```

use crate::journal_app::api_client::Transport;
use crate::journal_app::error::Result;
use crate::journal_app::local_db::{DurableStore, QUEUE_KEY, REJECTED_KEY, TRADES_CACHE_KEY};
use crate::journal_app::offline::retry::{ReplayOutcome, RetryDecision, RetryPolicy};
use crate::journal_app::sync::network_monitor::ConnectivitySignal;
use crate::shared::{time_based_id, SharedError};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Kind of write, mapped onto an HTTP method at replay time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub fn method(&self) -> Method {
        match self {
            Self::Create => Method::POST,
            Self::Update => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }
}

/// A write the caller wants delivered: what, where, and with which body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OperationType,
    /// Path relative to the API prefix, e.g. `/trades/t1`
    pub endpoint: String,
    #[serde(default)]
    pub payload: Value,
}

impl Operation {
    pub fn new(kind: OperationType, endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            kind,
            endpoint: endpoint.into(),
            payload,
        }
    }

    pub fn create<T: Serialize>(endpoint: impl Into<String>, payload: &T) -> Result<Self> {
        Ok(Self::new(
            OperationType::Create,
            endpoint,
            serde_json::to_value(payload)?,
        ))
    }

    pub fn update<T: Serialize>(endpoint: impl Into<String>, payload: &T) -> Result<Self> {
        Ok(Self::new(
            OperationType::Update,
            endpoint,
            serde_json::to_value(payload)?,
        ))
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(OperationType::Delete, endpoint, Value::Null)
    }

    pub fn validate(&self) -> std::result::Result<(), SharedError> {
        if self.endpoint.is_empty() {
            return Err(SharedError::invalid_endpoint("", "must not be empty"));
        }
        if !self.endpoint.starts_with('/') {
            return Err(SharedError::invalid_endpoint(
                self.endpoint.as_str(),
                "must start with '/'",
            ));
        }
        Ok(())
    }

    /// Request body for replay; deletes carry none
    pub fn body(&self) -> Option<&Value> {
        match self.kind {
            OperationType::Delete => None,
            _ if self.payload.is_null() => None,
            _ => Some(&self.payload),
        }
    }
}

/// Persisted queue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    #[serde(flatten)]
    pub operation: Operation,
    /// RFC 3339 enqueue time
    pub timestamp: String,
    /// Failed delivery attempts so far
    #[serde(default)]
    pub retries: u32,
}

impl QueueItem {
    fn new(operation: Operation) -> Self {
        Self {
            id: time_based_id("queue"),
            operation,
            timestamp: chrono::Utc::now().to_rfc3339(),
            retries: 0,
        }
    }

    pub fn kind(&self) -> OperationType {
        self.operation.kind
    }

    pub fn endpoint(&self) -> &str {
        &self.operation.endpoint
    }
}

/// Item the server refused, kept so the user can be told about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedOperation {
    #[serde(flatten)]
    pub item: QueueItem,
    pub reason: String,
    pub rejected_at: String,
}

/// Counters for one flush pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    pub attempted: usize,
    pub delivered: usize,
    pub retried: usize,
    pub dropped: usize,
    pub rejected: usize,
}

impl FlushReport {
    /// Items still queued for a later pass
    pub fn remaining(&self) -> usize {
        self.retried
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Connectivity signal said offline; nothing was attempted
    Offline,
    /// Another flush was in progress; nothing was attempted
    AlreadyRunning,
    Completed(FlushReport),
}

/// Last completed flush, for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushSummary {
    pub finished_at: String,
    pub report: FlushReport,
}

/// Clears the flushing flag when a flush ends, including on early return
struct FlushingGuard<'a>(&'a AtomicBool);

impl Drop for FlushingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Queue manager over a durable store and a transport
pub struct OfflineQueue {
    store: Arc<dyn DurableStore>,
    transport: Arc<dyn Transport>,
    connectivity: ConnectivitySignal,
    policy: RetryPolicy,
    /// Serializes read-modify-write cycles on the queue record
    write_lock: Mutex<()>,
    /// Set for the duration of a flush
    flushing: AtomicBool,
    last_flush: RwLock<Option<FlushSummary>>,
}

impl OfflineQueue {
    pub fn new(
        store: Arc<dyn DurableStore>,
        transport: Arc<dyn Transport>,
        connectivity: ConnectivitySignal,
    ) -> Self {
        Self {
            store,
            transport,
            connectivity,
            policy: RetryPolicy::default(),
            write_lock: Mutex::new(()),
            flushing: AtomicBool::new(false),
            last_flush: RwLock::new(None),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn connectivity(&self) -> &ConnectivitySignal {
        &self.connectivity
    }

    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// Append an operation; the returned item carries the generated id
    pub async fn enqueue(&self, operation: Operation) -> Result<QueueItem> {
        operation.validate()?;
        let item = QueueItem::new(operation);

        let _lock = self.write_lock.lock().await;
        let mut queue: Vec<QueueItem> = self.store.get_list(QUEUE_KEY).await?;
        queue.push(item.clone());
        self.store.set_list(QUEUE_KEY, &queue).await?;

        tracing::info!(
            "Queued {:?} {} as {} ({} pending)",
            item.kind(),
            item.endpoint(),
            item.id,
            queue.len()
        );
        Ok(item)
    }

    /// Current queue contents in FIFO order
    pub async fn get_queue(&self) -> Result<Vec<QueueItem>> {
        Ok(self.store.get_list(QUEUE_KEY).await?)
    }

    pub async fn pending_count(&self) -> Result<usize> {
        Ok(self.get_queue().await?.len())
    }

    /// Remove an item by id; returns whether it was present
    pub async fn remove_from_queue(&self, id: &str) -> Result<bool> {
        let _lock = self.write_lock.lock().await;
        let mut queue: Vec<QueueItem> = self.store.get_list(QUEUE_KEY).await?;
        let before = queue.len();
        queue.retain(|item| item.id != id);
        if queue.len() == before {
            return Ok(false);
        }
        self.store.set_list(QUEUE_KEY, &queue).await?;
        Ok(true)
    }

    async fn update_retries(&self, id: &str, retries: u32) -> Result<bool> {
        let _lock = self.write_lock.lock().await;
        let mut queue: Vec<QueueItem> = self.store.get_list(QUEUE_KEY).await?;
        let Some(item) = queue.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        item.retries = retries;
        self.store.set_list(QUEUE_KEY, &queue).await?;
        Ok(true)
    }

    async fn is_queued(&self, id: &str) -> Result<bool> {
        let _lock = self.write_lock.lock().await;
        let queue: Vec<QueueItem> = self.store.get_list(QUEUE_KEY).await?;
        Ok(queue.iter().any(|item| item.id == id))
    }

    /// Move an item to the rejected record; false if it already left the queue
    async fn reject(&self, item: QueueItem, reason: String) -> Result<bool> {
        let _lock = self.write_lock.lock().await;
        let mut queue: Vec<QueueItem> = self.store.get_list(QUEUE_KEY).await?;
        let before = queue.len();
        queue.retain(|queued| queued.id != item.id);
        if queue.len() == before {
            return Ok(false);
        }
        self.store.set_list(QUEUE_KEY, &queue).await?;

        let mut rejected: Vec<RejectedOperation> = self.store.get_list(REJECTED_KEY).await?;
        rejected.push(RejectedOperation {
            item,
            reason,
            rejected_at: chrono::Utc::now().to_rfc3339(),
        });
        self.store.set_list(REJECTED_KEY, &rejected).await?;
        Ok(true)
    }

    async fn replay(&self, item: &QueueItem) -> ReplayOutcome {
        let method = item.kind().method();
        match self
            .transport
            .send(method, item.endpoint(), item.operation.body())
            .await
        {
            Ok(status) => ReplayOutcome::from_status(status),
            Err(e) => ReplayOutcome::from_transport_error(&e),
        }
    }

    /// Replay the queue against the API.
    ///
    /// Works on a snapshot taken at the start: items enqueued during the pass
    /// wait for the next one, and items removed during the pass (by
    /// `remove_from_queue` or `clear_cache`) are skipped. Delivery failures are
    /// absorbed into retry bookkeeping; only store failures are returned as
    /// errors.
    pub async fn flush_queue(&self) -> Result<FlushOutcome> {
        if !self.connectivity.is_online() {
            tracing::info!("Offline - cannot flush queue");
            return Ok(FlushOutcome::Offline);
        }

        if self
            .flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Flush already in progress, skipping");
            return Ok(FlushOutcome::AlreadyRunning);
        }
        let _flushing = FlushingGuard(&self.flushing);

        let snapshot = self.get_queue().await?;
        let mut report = FlushReport::default();
        if !snapshot.is_empty() {
            tracing::info!("Flushing {} items from queue", snapshot.len());
        }

        for item in snapshot {
            if !self.is_queued(&item.id).await? {
                tracing::debug!("{} left the queue during the flush, skipping", item.id);
                continue;
            }
            report.attempted += 1;
            let outcome = self.replay(&item).await;

            match self.policy.decide(item.retries, &outcome) {
                RetryDecision::Delivered => {
                    self.remove_from_queue(&item.id).await?;
                    report.delivered += 1;
                    tracing::info!(
                        "Delivered {:?} {} ({})",
                        item.kind(),
                        item.endpoint(),
                        item.id
                    );
                }
                RetryDecision::Retry { retries } => {
                    if !self.update_retries(&item.id, retries).await? {
                        continue;
                    }
                    report.retried += 1;
                    tracing::warn!(
                        "Failed to deliver {} ({}), attempt {}/{}",
                        item.id,
                        outcome.reason().unwrap_or("unknown"),
                        retries,
                        self.policy.max_retries
                    );
                }
                RetryDecision::Drop { retries } => {
                    self.remove_from_queue(&item.id).await?;
                    report.dropped += 1;
                    tracing::error!(
                        "Dropping {:?} {} ({}) after {} attempts: {}",
                        item.kind(),
                        item.endpoint(),
                        item.id,
                        retries,
                        outcome.reason().unwrap_or("unknown")
                    );
                }
                RetryDecision::Reject => {
                    let reason = outcome.reason().unwrap_or("rejected").to_string();
                    tracing::error!(
                        "Server rejected {:?} {} ({}): {}",
                        item.kind(),
                        item.endpoint(),
                        item.id,
                        reason
                    );
                    if self.reject(item, reason).await? {
                        report.rejected += 1;
                    }
                }
            }
        }

        *self.last_flush.write().await = Some(FlushSummary {
            finished_at: chrono::Utc::now().to_rfc3339(),
            report,
        });
        Ok(FlushOutcome::Completed(report))
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::Acquire)
    }

    pub async fn last_flush(&self) -> Option<FlushSummary> {
        self.last_flush.read().await.clone()
    }

    /// Operations the server refused permanently
    pub async fn rejected(&self) -> Result<Vec<RejectedOperation>> {
        Ok(self.store.get_list(REJECTED_KEY).await?)
    }

    /// Forget a rejected operation once the user has seen it
    pub async fn dismiss_rejected(&self, id: &str) -> Result<bool> {
        let _lock = self.write_lock.lock().await;
        let mut rejected: Vec<RejectedOperation> = self.store.get_list(REJECTED_KEY).await?;
        let before = rejected.len();
        rejected.retain(|entry| entry.item.id != id);
        if rejected.len() == before {
            return Ok(false);
        }
        self.store.set_list(REJECTED_KEY, &rejected).await?;
        Ok(true)
    }

    /// Append a snapshot to the trades cache.
    ///
    /// The cache is diagnostic only; snapshots are stored as opaque JSON.
    pub async fn cache_trade<T: Serialize>(&self, snapshot: &T) -> Result<()> {
        let snapshot = serde_json::to_value(snapshot)?;
        let _lock = self.write_lock.lock().await;
        let mut cached: Vec<Value> = self.store.get_list(TRADES_CACHE_KEY).await?;
        cached.push(snapshot);
        self.store.set_list(TRADES_CACHE_KEY, &cached).await?;
        tracing::debug!("Cached trade snapshot ({} total)", cached.len());
        Ok(())
    }

    pub async fn cached_trades(&self) -> Result<Vec<Value>> {
        Ok(self.store.get_list(TRADES_CACHE_KEY).await?)
    }

    /// Wipe the queue, the trade cache and the rejected record
    pub async fn clear_cache(&self) -> Result<()> {
        let _lock = self.write_lock.lock().await;
        self.store.remove(QUEUE_KEY).await?;
        self.store.remove(TRADES_CACHE_KEY).await?;
        self.store.remove(REJECTED_KEY).await?;
        tracing::info!("Cleared offline queue and trade cache");
        Ok(())
    }
}
