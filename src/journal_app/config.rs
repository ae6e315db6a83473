use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError, FailureHandling};
use crate::journal_app::local_db::SqliteStore;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the server origin
pub const ENV_API_URL: &str = "JOURNAL_API_URL";
/// Environment variable overriding the store file
pub const ENV_STORE_PATH: &str = "JOURNAL_STORE_PATH";
/// Environment variable carrying a bearer token
pub const ENV_TOKEN: &str = "JOURNAL_TOKEN";

/// Client configuration wrapper.
#[derive(Debug, Clone, Default)]
pub struct Config {
    app: AppConfig,
    token: Option<String>,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_app(app: AppConfig) -> Self {
        Self { app, token: None }
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self::from_app(builder.build()?))
    }

    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let app = match path {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        let mut config = Self::from_app(app);
        config.apply_env();
        config.app.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            self.app.server_url = url;
        }
        if let Ok(path) = std::env::var(ENV_STORE_PATH) {
            self.app.store_path = Some(PathBuf::from(path));
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            if !token.is_empty() {
                self.token = Some(token);
            }
        }
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the bearer token
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    /// Clear the token (logout)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Full URL for a queued endpoint such as `/trades/{id}`
    pub fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}{}{}",
            self.server_url().trim_end_matches('/'),
            self.app.api_prefix,
            endpoint
        )
    }

    pub fn server_url(&self) -> &str {
        &self.app.server_url
    }

    pub fn store_path(&self) -> PathBuf {
        self.app
            .store_path
            .clone()
            .unwrap_or_else(SqliteStore::default_path)
    }

    pub fn retry_ceiling(&self) -> u32 {
        self.app.retry_ceiling
    }

    pub fn failure_handling(&self) -> FailureHandling {
        self.app.failure_handling
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.app.poll_interval_secs)
    }

    /// Interval between health probes, if probing is enabled
    pub fn health_probe_interval(&self) -> Option<Duration> {
        self.app
            .health_probe_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }
}
