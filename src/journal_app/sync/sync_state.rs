//! # Sync State
//!
//! Snapshot of the offline subsystem for status indicators: connectivity,
//! pending and rejected counts, and the last flush.

use crate::journal_app::offline::queue::FlushSummary;
use crate::journal_app::sync::network_monitor::NetworkStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub network_status: NetworkStatus,
    pub pending_operations: usize,
    pub rejected_operations: usize,
    pub last_flush: Option<FlushSummary>,
    pub is_flushing: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            network_status: NetworkStatus::Offline,
            pending_operations: 0,
            rejected_operations: 0,
            last_flush: None,
            is_flushing: false,
        }
    }
}

impl SyncState {
    pub fn is_offline(&self) -> bool {
        !self.network_status.is_online()
    }

    /// Whether a manual "sync now" makes sense
    pub fn can_sync_now(&self) -> bool {
        !self.is_offline() && self.pending_operations > 0 && !self.is_flushing
    }

    /// Banner text, or `None` when there is nothing to show
    pub fn notice(&self) -> Option<String> {
        if self.is_offline() {
            return Some("You're offline. Changes will sync when you're back online.".to_string());
        }
        match self.pending_operations {
            0 => None,
            1 => Some("1 item pending sync".to_string()),
            n => Some(format!("{} items pending sync", n)),
        }
    }
}
