//! # Network Monitor
//!
//! Bridges connectivity changes to the offline queue.
//!
//! ## Components
//!
//! - **ConnectivitySignal**: the current online/offline state plus a stream of
//!   transitions. Hosts flip it from whatever connectivity source they have.
//! - **ConnectivityMonitor**: flushes the queue once for every transition to
//!   online; transitions to offline are only logged.
//! - **HealthProbe**: optional source for hosts without a native connectivity
//!   event; polls `GET /health` and flips the signal.

use crate::journal_app::api_client::HttpTransport;
use crate::journal_app::offline::queue::{FlushOutcome, OfflineQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

impl NetworkStatus {
    pub fn from_online(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Shared connectivity state.
///
/// `is_online` is synchronous. Every actual change of state is also published
/// as a transition event; setting the current state again publishes nothing.
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    state: Arc<watch::Sender<NetworkStatus>>,
    transitions: broadcast::Sender<NetworkStatus>,
}

impl ConnectivitySignal {
    pub fn new(initial: NetworkStatus) -> Self {
        let (state, _) = watch::channel(initial);
        let (transitions, _) = broadcast::channel(16);
        Self {
            state: Arc::new(state),
            transitions,
        }
    }

    pub fn status(&self) -> NetworkStatus {
        *self.state.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.status().is_online()
    }

    /// Update the state; returns whether it changed
    pub fn set(&self, status: NetworkStatus) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            // No subscribers is fine
            let _ = self.transitions.send(status);
        }
        changed
    }

    pub fn set_online(&self) -> bool {
        self.set(NetworkStatus::Online)
    }

    pub fn set_offline(&self) -> bool {
        self.set(NetworkStatus::Offline)
    }

    /// Watch the current state (for UI indicators)
    pub fn watch(&self) -> watch::Receiver<NetworkStatus> {
        self.state.subscribe()
    }

    /// Receive every transition from now on
    pub fn transitions(&self) -> broadcast::Receiver<NetworkStatus> {
        self.transitions.subscribe()
    }
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new(NetworkStatus::Online)
    }
}

/// Flushes the queue on every transition to online
pub struct ConnectivityMonitor {
    queue: Arc<OfflineQueue>,
    transitions: broadcast::Receiver<NetworkStatus>,
}

impl ConnectivityMonitor {
    /// Subscribe to the queue's connectivity signal.
    ///
    /// Transitions that happen after this call are observed, even if `run`
    /// starts later.
    pub fn new(queue: Arc<OfflineQueue>) -> Self {
        let transitions = queue.connectivity().transitions();
        Self { queue, transitions }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process transitions until the signal is dropped
    pub async fn run(mut self) {
        loop {
            match self.transitions.recv().await {
                Ok(NetworkStatus::Online) => self.on_online().await,
                Ok(NetworkStatus::Offline) => {
                    tracing::info!("Gone offline");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} connectivity transitions", skipped);
                    if self.queue.connectivity().is_online() {
                        self.on_online().await;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("Connectivity monitor stopped");
    }

    async fn on_online(&self) {
        tracing::info!("Back online - flushing queue");
        match self.queue.flush_queue().await {
            Ok(FlushOutcome::Completed(report)) => {
                tracing::info!(
                    "Flush after reconnect: {} delivered, {} retrying, {} dropped, {} rejected",
                    report.delivered,
                    report.retried,
                    report.dropped,
                    report.rejected
                );
            }
            Ok(outcome) => tracing::debug!("Flush after reconnect skipped: {:?}", outcome),
            Err(e) => tracing::error!("Flush after reconnect failed: {}", e),
        }
    }
}

/// Polls the API health endpoint and drives a connectivity signal from it
pub struct HealthProbe {
    transport: Arc<HttpTransport>,
    signal: ConnectivitySignal,
    interval: Duration,
}

impl HealthProbe {
    pub fn new(transport: Arc<HttpTransport>, signal: ConnectivitySignal, interval: Duration) -> Self {
        Self {
            transport,
            signal,
            interval,
        }
    }

    /// Probe once and update the signal
    pub async fn probe(&self) -> NetworkStatus {
        let status = NetworkStatus::from_online(self.transport.health().await);
        if self.signal.set(status) {
            tracing::debug!("Health probe changed connectivity to {:?}", status);
        }
        status
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.probe().await;
            }
        })
    }
}
