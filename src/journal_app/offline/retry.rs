//! # Replay Outcomes and Retry Policy
//!
//! Classifies each replay attempt and decides what happens to the queue item
//! afterwards. Retries are consumed across separate flush passes; nothing here
//! sleeps or loops.
//!
//! ## Classification
//!
//! - **Delivered**: any 2xx
//! - **PermanentFailure**: 4xx other than 408 and 429
//! - **RetryableFailure**: everything else, including transport errors
//!
//! ## Usage
//!
//! ```rust
//! use tradejournal_sync::journal_app::offline::retry::{ReplayOutcome, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! let decision = policy.decide(0, &ReplayOutcome::from_status(503));
//! assert_eq!(decision, RetryDecision::Retry { retries: 1 });
//! ```

use crate::journal_app::api_client::TransportError;
use crate::shared::config::{FailureHandling, DEFAULT_RETRY_CEILING};

/// Result of one replay attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    Delivered,
    /// Worth trying again on a later pass (offline, timeout, 5xx)
    RetryableFailure(String),
    /// The server refused the payload; retrying cannot help
    PermanentFailure(String),
}

impl ReplayOutcome {
    /// Classify an HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Delivered,
            408 | 429 => Self::RetryableFailure(format!("HTTP {}", status)),
            400..=499 => Self::PermanentFailure(format!("HTTP {}", status)),
            _ => Self::RetryableFailure(format!("HTTP {}", status)),
        }
    }

    /// Transport failures are always retryable
    pub fn from_transport_error(error: &TransportError) -> Self {
        Self::RetryableFailure(error.to_string())
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Delivered => None,
            Self::RetryableFailure(reason) | Self::PermanentFailure(reason) => Some(reason),
        }
    }
}

/// What the queue manager does with an item after an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Remove the item: the server accepted it
    Delivered,
    /// Write the item back in place with the new retry count
    Retry { retries: u32 },
    /// Discard the item: the retry ceiling was reached
    Drop { retries: u32 },
    /// Move the item to the rejected record
    Reject,
}

/// Retry ceiling plus the failure counting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub failure_handling: FailureHandling,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::uniform(DEFAULT_RETRY_CEILING)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, failure_handling: FailureHandling) -> Self {
        Self {
            max_retries,
            failure_handling,
        }
    }

    /// Every failure counts toward the ceiling
    pub fn uniform(max_retries: u32) -> Self {
        Self::new(max_retries, FailureHandling::Uniform)
    }

    /// Permanent failures are rejected immediately; only retryable ones count
    pub fn classified(max_retries: u32) -> Self {
        Self::new(max_retries, FailureHandling::Classified)
    }

    /// Decide the fate of an item that had `retries` failed attempts before this one
    pub fn decide(&self, retries: u32, outcome: &ReplayOutcome) -> RetryDecision {
        match (outcome, self.failure_handling) {
            (ReplayOutcome::Delivered, _) => RetryDecision::Delivered,
            (ReplayOutcome::PermanentFailure(_), FailureHandling::Classified) => RetryDecision::Reject,
            _ => {
                let retries = retries.saturating_add(1);
                if retries >= self.max_retries {
                    RetryDecision::Drop { retries }
                } else {
                    RetryDecision::Retry { retries }
                }
            }
        }
    }
}
