//! Scripted transport for queue and coordinator tests
//!
//! Answers each request with the next scripted reply (falling back to a
//! default) and records every request it receives.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tradejournal_sync::journal_app::api_client::{TradeSource, Transport, TransportError};
use tradejournal_sync::shared::Trade;

/// Reply for one request: a status code or a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Status(u16),
    NetworkDown,
}

/// A request as the transport saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
}

pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: Mutex<Vec<RecordedCall>>,
    remote: Mutex<Vec<Trade>>,
}

impl ScriptedTransport {
    /// Every request gets `fallback`
    pub fn always(fallback: Reply) -> Arc<Self> {
        Self::scripted(Vec::new(), fallback)
    }

    /// Requests get `script` in order, then `fallback`
    pub fn scripted(script: Vec<Reply>, fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
            remote: Mutex::new(Vec::new()),
        })
    }

    /// Trades returned by `fetch_trades`
    pub fn set_remote(&self, trades: Vec<Trade>) {
        *self.remote.lock().unwrap() = trades;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.endpoint).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<u16, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            endpoint: endpoint.to_string(),
            body: body.cloned(),
        });

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        match reply {
            Reply::Status(status) => Ok(status),
            Reply::NetworkDown => Err(TransportError::Network("connection refused".to_string())),
        }
    }
}

#[async_trait]
impl TradeSource for ScriptedTransport {
    async fn fetch_trades(&self) -> Result<Vec<Trade>, TransportError> {
        Ok(self.remote.lock().unwrap().clone())
    }
}
