//! # State Reconciliation
//!
//! Merges a freshly fetched server collection into local state without
//! discarding unsynced local work.
//!
//! ## Algorithm
//!
//! 1. Walk the remote records in order. A record that also exists locally is
//!    resolved by the merge strategy; otherwise the remote record is adopted.
//! 2. Append every local record whose id the server does not know (pending
//!    creates), in local order.
//!
//! Nothing is silently dropped. Display order is the caller's concern.
//!
//! ## Usage
//!
//! ```rust
//! use tradejournal_sync::journal_app::offline::reconciliation::{reconcile, LocalWins};
//! use tradejournal_sync::shared::trade::sample_trades;
//!
//! let local = sample_trades();
//! let merged = reconcile(&local, &[], &LocalWins);
//! assert_eq!(merged.len(), local.len());
//! ```

use crate::shared::Trade;
use chrono::DateTime;
use std::collections::{HashMap, HashSet};

/// Record with a stable identity
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Record carrying an RFC 3339 modification time
pub trait Timestamped {
    fn updated_at(&self) -> &str;
}

impl Keyed for Trade {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Timestamped for Trade {
    fn updated_at(&self) -> &str {
        &self.updated_at
    }
}

/// Resolves a record present on both sides
pub trait MergeStrategy<T>: Send + Sync {
    fn merge(&self, local: &T, remote: &T) -> T;
}

/// Keep the local version (it may hold edits the server has not seen)
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalWins;

impl<T: Clone> MergeStrategy<T> for LocalWins {
    fn merge(&self, local: &T, _remote: &T) -> T {
        local.clone()
    }
}

/// Keep the server version
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteWins;

impl<T: Clone> MergeStrategy<T> for RemoteWins {
    fn merge(&self, _local: &T, remote: &T) -> T {
        remote.clone()
    }
}

/// Keep whichever side was modified last; ties keep local.
///
/// Timestamps that do not parse as RFC 3339 are compared as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestUpdate;

impl LatestUpdate {
    fn remote_is_newer(local: &str, remote: &str) -> bool {
        match (
            DateTime::parse_from_rfc3339(local),
            DateTime::parse_from_rfc3339(remote),
        ) {
            (Ok(local), Ok(remote)) => remote > local,
            _ => remote > local,
        }
    }
}

impl<T: Clone + Timestamped> MergeStrategy<T> for LatestUpdate {
    fn merge(&self, local: &T, remote: &T) -> T {
        if Self::remote_is_newer(local.updated_at(), remote.updated_at()) {
            remote.clone()
        } else {
            local.clone()
        }
    }
}

/// Merge `remote` into `local` using `strategy` for records on both sides
pub fn reconcile<T, S>(local: &[T], remote: &[T], strategy: &S) -> Vec<T>
where
    T: Keyed + Clone,
    S: MergeStrategy<T> + ?Sized,
{
    let local_by_key: HashMap<&str, &T> = local.iter().map(|r| (r.key(), r)).collect();
    let remote_keys: HashSet<&str> = remote.iter().map(|r| r.key()).collect();

    let mut merged = Vec::with_capacity(local.len() + remote.len());
    let mut resolved = 0usize;

    for record in remote {
        match local_by_key.get(record.key()) {
            Some(local_record) => {
                merged.push(strategy.merge(local_record, record));
                resolved += 1;
            }
            None => merged.push(record.clone()),
        }
    }

    let before_local_only = merged.len();
    merged.extend(
        local
            .iter()
            .filter(|record| !remote_keys.contains(record.key()))
            .cloned(),
    );

    tracing::debug!(
        "Reconciled {} remote with {} local: {} resolved, {} local-only",
        remote.len(),
        local.len(),
        resolved,
        merged.len() - before_local_only
    );
    merged
}
