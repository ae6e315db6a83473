//! # Background Sync Service
//!
//! Wires the offline queue to its background drivers.
//!
//! ## Architecture
//!
//! - **Network Monitor**: flushes the queue on every transition to online
//! - **Scheduler**: publishes the pending count and connectivity for UI badges
//! - **Health Probe** (optional): drives connectivity from `GET /health`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tradejournal_sync::journal_app::api_client::HttpTransport;
//! use tradejournal_sync::journal_app::config::Config;
//! use tradejournal_sync::journal_app::local_db::MemoryStore;
//! use tradejournal_sync::journal_app::offline::OfflineQueue;
//! use tradejournal_sync::journal_app::sync::{network_monitor::ConnectivitySignal, SyncService};
//!
//! # async fn example() -> tradejournal_sync::journal_app::error::Result<()> {
//! let transport = Arc::new(HttpTransport::new(Config::new()));
//! let queue = Arc::new(OfflineQueue::new(
//!     Arc::new(MemoryStore::new()),
//!     transport.clone(),
//!     ConnectivitySignal::default(),
//! ));
//!
//! let mut service = SyncService::new(queue, Duration::from_secs(5))
//!     .with_health_probe(transport, Duration::from_secs(30));
//! service.start()?;
//!
//! // "Sync now" button
//! let outcome = service.sync_now().await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod network_monitor;
pub mod scheduler;
pub mod sync_state;

pub use network_monitor::{ConnectivityMonitor, ConnectivitySignal, HealthProbe, NetworkStatus};
pub use scheduler::SyncScheduler;
pub use sync_state::SyncState;

use crate::journal_app::api_client::HttpTransport;
use crate::journal_app::config::Config;
use crate::journal_app::error::{Result, SyncError};
use crate::journal_app::offline::queue::{FlushOutcome, OfflineQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Owns the background tasks of the offline subsystem
pub struct SyncService {
    queue: Arc<OfflineQueue>,
    scheduler: Arc<SyncScheduler>,
    probe: Option<(Arc<HttpTransport>, Duration)>,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncService {
    pub fn new(queue: Arc<OfflineQueue>, poll_interval: Duration) -> Self {
        let scheduler = Arc::new(SyncScheduler::new(queue.clone(), poll_interval));
        Self {
            queue,
            scheduler,
            probe: None,
            tasks: Vec::new(),
        }
    }

    /// Poll interval and optional health probe taken from configuration
    pub fn from_config(config: &Config, queue: Arc<OfflineQueue>, transport: Arc<HttpTransport>) -> Self {
        let service = Self::new(queue, config.poll_interval());
        match config.health_probe_interval() {
            Some(interval) => service.with_health_probe(transport, interval),
            None => service,
        }
    }

    /// Also poll the API health endpoint to drive connectivity
    pub fn with_health_probe(mut self, transport: Arc<HttpTransport>, interval: Duration) -> Self {
        self.probe = Some((transport, interval));
        self
    }

    /// Spawn the monitor, the scheduler and the optional probe
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(SyncError::AlreadyRunning);
        }

        self.tasks.push(ConnectivityMonitor::new(self.queue.clone()).spawn());
        self.tasks.push(self.scheduler.clone().spawn());

        if let Some((transport, interval)) = &self.probe {
            let probe = HealthProbe::new(
                transport.clone(),
                self.queue.connectivity().clone(),
                *interval,
            );
            self.tasks.push(probe.spawn());
        }

        tracing::info!("Sync service started ({} tasks)", self.tasks.len());
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::info!("Sync service stopped");
    }

    pub fn has_health_probe(&self) -> bool {
        self.probe.is_some()
    }

    pub fn poll_interval(&self) -> Duration {
        self.scheduler.interval()
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Flush immediately and refresh the published state
    pub async fn sync_now(&self) -> Result<FlushOutcome> {
        let outcome = self.queue.flush_queue().await?;
        self.scheduler.refresh().await?;
        Ok(outcome)
    }

    pub fn status(&self) -> SyncState {
        self.scheduler.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.scheduler.subscribe()
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.stop();
    }
}
