//! Application configuration module
//!
//! Provides the configuration types for the offline sync client. Values come
//! from defaults, an optional TOML file, and a builder for programmatic use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default API server origin
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4000";

/// Default path prefix every API route lives under
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Failed replays allowed before a queue item is discarded
pub const DEFAULT_RETRY_CEILING: u32 = 3;

/// Interval of the pending-count poller
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// How replay failures are counted against the retry ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureHandling {
    /// Every failure (network, 4xx, 5xx) consumes a retry; items are dropped at the ceiling.
    #[default]
    Uniform,
    /// 4xx rejections are set aside immediately; only retryable failures consume retries.
    Classified,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server origin, e.g. `http://127.0.0.1:4000`
    pub server_url: String,
    /// Prefix prepended to every queued endpoint
    pub api_prefix: String,
    /// SQLite file backing the durable queue store
    pub store_path: Option<PathBuf>,
    /// Failed attempts before an item is dropped
    pub retry_ceiling: u32,
    /// Failure counting policy
    pub failure_handling: FailureHandling,
    /// Pending-count poll interval in seconds
    pub poll_interval_secs: u64,
    /// Health probe interval in seconds; `None` disables probing
    pub health_probe_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            store_path: None,
            retry_ceiling: DEFAULT_RETRY_CEILING,
            failure_handling: FailureHandling::Uniform,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            health_probe_secs: None,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "api_prefix",
                message: format!("'{}' must start with '/'", self.api_prefix),
            });
        }
        if self.retry_ceiling == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_ceiling",
                message: "must be at least 1".to_string(),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    api_prefix: Option<String>,
    store_path: Option<PathBuf>,
    retry_ceiling: Option<u32>,
    failure_handling: Option<FailureHandling>,
    poll_interval_secs: Option<u64>,
    health_probe_secs: Option<u64>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the API prefix
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = Some(prefix.into());
        self
    }

    /// Set the durable store file
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Set the retry ceiling
    pub fn retry_ceiling(mut self, ceiling: u32) -> Self {
        self.retry_ceiling = Some(ceiling);
        self
    }

    /// Set the failure handling policy
    pub fn failure_handling(mut self, handling: FailureHandling) -> Self {
        self.failure_handling = Some(handling);
        self
    }

    /// Set the pending-count poll interval
    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = Some(secs);
        self
    }

    /// Enable the health probe
    pub fn health_probe_secs(mut self, secs: u64) -> Self {
        self.health_probe_secs = Some(secs);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            server_url: self.server_url.unwrap_or(defaults.server_url),
            api_prefix: self.api_prefix.unwrap_or(defaults.api_prefix),
            store_path: self.store_path.or(defaults.store_path),
            retry_ceiling: self.retry_ceiling.unwrap_or(defaults.retry_ceiling),
            failure_handling: self.failure_handling.unwrap_or(defaults.failure_handling),
            poll_interval_secs: self.poll_interval_secs.unwrap_or(defaults.poll_interval_secs),
            health_probe_secs: self.health_probe_secs.filter(|secs| *secs > 0),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to read config: {0}")]
    Io(String),
}
