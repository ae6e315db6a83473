//! Sync Client Error Types
//!
//! `SyncError` is what the queue manager, the optimistic coordinator and the
//! sync service return. Expected network failures during replay never become
//! a `SyncError`; they are absorbed into retry bookkeeping. Store failures and
//! malformed operations do surface.

use crate::journal_app::api_client::TransportError;
use crate::journal_app::local_db::StoreError;
use crate::shared::{ConfigError, SharedError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Durable store could not be read or written
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Network call failed outside of queue replay (e.g. fetching trades)
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Operation or record failed validation
    #[error(transparent)]
    Shared(#[from] SharedError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The sync service was asked to start twice
    #[error("sync service is already running")]
    AlreadyRunning,
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Shared(SharedError::from(err))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
