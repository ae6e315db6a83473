//! Journal model errors
//!
//! Raised by queue operations and trade edits before anything touches the
//! network or the durable store.
//!
//! ```rust
//! use tradejournal_sync::shared::error::SharedError;
//!
//! let error = SharedError::unknown_trade("trade_42");
//! assert_eq!(error.to_string(), "no trade with id trade_42");
//! ```
use thiserror::Error;

/// Rejections from the journal model and queue payloads
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Queue endpoints are relative API paths such as `/trades/{id}`
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        endpoint: String,
        reason: &'static str,
    },

    /// An edit referred to a trade missing from the local collection
    #[error("no trade with id {id}")]
    UnknownTrade { id: String },

    /// A trade or patch could not be turned into a JSON payload
    #[error("payload encoding failed: {0}")]
    Payload(String),
}

impl SharedError {
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason,
        }
    }

    pub fn unknown_trade(id: impl Into<String>) -> Self {
        Self::UnknownTrade { id: id.into() }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}
