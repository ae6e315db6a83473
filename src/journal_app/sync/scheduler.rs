//! # Sync Scheduler
//!
//! Periodically samples the offline queue and publishes a `SyncState` for
//! status indicators. Presentation only: it never flushes or mutates the
//! queue.

use crate::journal_app::error::Result;
use crate::journal_app::offline::queue::OfflineQueue;
use crate::journal_app::sync::sync_state::SyncState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct SyncScheduler {
    queue: Arc<OfflineQueue>,
    interval: Duration,
    state: watch::Sender<SyncState>,
}

impl SyncScheduler {
    pub fn new(queue: Arc<OfflineQueue>, interval: Duration) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            queue,
            interval,
            state,
        }
    }

    /// Receiver for the published snapshots
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn current(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Read the queue once and publish the result
    pub async fn refresh(&self) -> Result<SyncState> {
        let snapshot = SyncState {
            network_status: self.queue.connectivity().status(),
            pending_operations: self.queue.pending_count().await?,
            rejected_operations: self.queue.rejected().await?.len(),
            last_flush: self.queue.last_flush().await,
            is_flushing: self.queue.is_flushing(),
        };
        self.state.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot.clone();
                true
            }
        });
        Ok(snapshot)
    }

    /// Poll until the task is aborted
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = self.refresh().await {
                    tracing::warn!("Failed to read sync state: {}", e);
                }
            }
        })
    }
}
