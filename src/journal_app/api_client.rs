/**
 * Journal API Client
 *
 * Network transport for the offline queue plus the two read calls the sync
 * client needs: the trade list used for reconciliation and the health probe.
 * Every request goes to `server_url + api_prefix + endpoint` and carries the
 * bearer token when one is configured.
 */

use crate::journal_app::config::Config;
use crate::shared::Trade;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

/// Transport-level failures (no HTTP status was obtained, or the body was unusable)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Capability to deliver one JSON request to the journal API.
///
/// Returns the HTTP status code; interpreting it is up to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<u16, TransportError>;
}

/// Source of the authoritative trade list
#[async_trait]
pub trait TradeSource: Send + Sync {
    async fn fetch_trades(&self) -> Result<Vec<Trade>, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug)]
pub struct HttpTransport {
    config: Config,
    client: Client,
    token: RwLock<Option<String>>,
}

impl HttpTransport {
    pub fn new(config: Config) -> Self {
        let token = config.get_token().cloned();
        Self {
            config,
            client: Client::new(),
            token: RwLock::new(token),
        }
    }

    /// Replace the bearer token (login / logout)
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn request(&self, method: Method, endpoint: &str) -> reqwest::RequestBuilder {
        let url = self.config.api_url(endpoint);
        let mut request = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json");

        if let Some(token) = self.token.read().await.as_ref() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request
    }

    /// Whether GET /health answers with a 2xx
    pub async fn health(&self) -> bool {
        match self.request(Method::GET, "/health").await.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Health probe failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<u16, TransportError> {
        let mut request = self.request(method.clone(), endpoint).await;
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        tracing::debug!("{} {} -> {}", method, endpoint, status);
        Ok(status)
    }
}

#[async_trait]
impl TradeSource for HttpTransport {
    /// Fetch the authoritative trade list via GET /trades
    async fn fetch_trades(&self) -> Result<Vec<Trade>, TransportError> {
        let response = self.request(Method::GET, "/trades").await.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let trades: Vec<Trade> = response.json().await?;
        tracing::debug!("Fetched {} trades from server", trades.len());
        Ok(trades)
    }
}
