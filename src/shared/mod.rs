//! Shared Module
//!
//! This module contains the platform-agnostic types used by the offline sync
//! client: the trade record the journal API exchanges, error types and the
//! application configuration.

/// Trade record, partial updates and P/L arithmetic
pub mod trade;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError, FailureHandling};
pub use error::SharedError;
pub use trade::{Direction, Emotion, EmotionType, Trade, TradeStatus, TradeUpdate};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Build a `{prefix}_{unix_millis}_{suffix}` identifier.
///
/// The suffix is nine base36 characters drawn from a v4 UUID so ids created
/// within the same millisecond still differ.
pub fn time_based_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = uuid::Uuid::new_v4();
    let suffix: String = random
        .as_bytes()
        .iter()
        .take(9)
        .map(|byte| BASE36[(*byte as usize) % BASE36.len()] as char)
        .collect();
    format!("{}_{}_{}", prefix, millis, suffix)
}
