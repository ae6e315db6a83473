//! # Offline Write Path
//!
//! Keeps user edits durable while the journal API is unreachable.
//!
//! ## Key Components
//!
//! - `queue.rs`: durable FIFO of pending writes and the flush routine
//! - `retry.rs`: replay outcome classification and the retry ceiling
//! - `optimistic.rs`: local-first mutations with direct-or-queue delivery
//! - `reconciliation.rs`: merging server trades into local state

pub mod optimistic;
pub mod queue;
pub mod reconciliation;
pub mod retry;

pub use optimistic::{MutationPath, OptimisticCoordinator};
pub use queue::{
    FlushOutcome, FlushReport, FlushSummary, OfflineQueue, Operation, OperationType, QueueItem,
    RejectedOperation,
};
pub use reconciliation::{reconcile, LatestUpdate, LocalWins, MergeStrategy, RemoteWins};
pub use retry::{ReplayOutcome, RetryDecision, RetryPolicy};
