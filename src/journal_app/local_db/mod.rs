//! # Local Database Module
//!
//! Durable key/value persistence for the offline sync client. The store holds
//! three named records:
//!
//! - **`offline_queue`**: ordered list of pending mutations
//! - **`trades_cache`**: opaque trade snapshots kept for diagnostics
//! - **`rejected_operations`**: mutations the server refused outright
//!
//! ## Key Components
//!
//! - `DurableStore`: async get/set/remove over JSON values
//! - `SqliteStore`: SQLite-backed implementation that survives restarts
//! - `MemoryStore`: process-local implementation for tests and ephemeral use
//! - `schema.rs`: table definitions and migration bookkeeping
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tradejournal_sync::journal_app::local_db::{DurableStore, SqliteStore, QUEUE_KEY};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn DurableStore> = Arc::new(SqliteStore::open(SqliteStore::default_path()).await?);
//! let pending: Vec<serde_json::Value> = store.get_list(QUEUE_KEY).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The store has no transactions or versioning. Callers that read-modify-write
//! a record are expected to serialize those writes themselves.

pub mod memory;
pub mod schema;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Record holding the pending-operation queue
pub const QUEUE_KEY: &str = "offline_queue";

/// Record holding cached trade snapshots
pub const TRADES_CACHE_KEY: &str = "trades_cache";

/// Record holding operations the server permanently rejected
pub const REJECTED_KEY: &str = "rejected_operations";

/// Errors raised by the durable store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for local database operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Crash-resistant key/value persistence.
///
/// `get` never fails on a missing key; it returns `None`.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrite the stored value
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

impl dyn DurableStore {
    /// Read a list record, treating a missing key as empty
    pub async fn get_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.get(key).await? {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// Overwrite a list record
    pub async fn set_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let value = serde_json::to_value(items)?;
        self.set(key, value).await
    }
}

/// SQLite-backed durable store
///
/// Uses a single pooled connection so writes from this process are applied in
/// the order they are issued.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open or create the store file
    ///
    /// Creates the parent directory and the database file if they don't exist,
    /// then initializes the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        tracing::debug!("Opened durable store at {}", path.display());
        Self::with_pool(pool).await
    }

    /// Open a store that lives only as long as this value
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // The in-memory database disappears with its connection, so keep it alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Platform-specific default location of the store file
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("tradejournal");
        path.push("offline.db");
        path
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(schema::CREATE_KV_TABLE)
            .execute(&self.pool)
            .await?;
        self.run_migrations().await
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(schema::CREATE_MIGRATIONS_TABLE)
            .execute(&self.pool)
            .await?;

        let current_version: (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await?;

        for version in schema::get_pending_migrations(current_version.0) {
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(version)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await?;
            tracing::debug!("Applied store migration {}", version);
        }

        Ok(())
    }

    /// Get connection pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, flushing the WAL
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("value")?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let raw = serde_json::to_string(&value)?;
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(raw)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
