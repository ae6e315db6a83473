//! Local trade collection
//!
//! In-memory trades the UI renders from. Mutated by optimistic actions and by
//! reconciliation; never rolled back when a server call fails.

use crate::journal_app::offline::reconciliation::{reconcile, MergeStrategy};
use crate::shared::trade::sample_trades;
use crate::shared::{Trade, TradeUpdate};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session-wide trade list, unique by id. Cheap to clone (shared handle).
#[derive(Debug, Clone, Default)]
pub struct TradeCollection {
    trades: Arc<RwLock<Vec<Trade>>>,
}

impl TradeCollection {
    pub fn new(trades: Vec<Trade>) -> Self {
        Self {
            trades: Arc::new(RwLock::new(trades)),
        }
    }

    /// Collection seeded with the bundled sample trades
    pub fn with_samples() -> Self {
        Self::new(sample_trades())
    }

    /// Insert at the front; an existing trade with the same id is replaced in place
    pub async fn add(&self, trade: Trade) {
        let mut trades = self.trades.write().await;
        match trades.iter_mut().find(|t| t.id == trade.id) {
            Some(existing) => *existing = trade,
            None => trades.insert(0, trade),
        }
    }

    /// Apply a partial update; returns the updated trade when it exists
    pub async fn update(&self, id: &str, update: &TradeUpdate) -> Option<Trade> {
        let mut trades = self.trades.write().await;
        let trade = trades.iter_mut().find(|t| t.id == id)?;
        trade.apply(update);
        Some(trade.clone())
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut trades = self.trades.write().await;
        let before = trades.len();
        trades.retain(|t| t.id != id);
        trades.len() != before
    }

    pub async fn get(&self, id: &str) -> Option<Trade> {
        self.trades.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn all(&self) -> Vec<Trade> {
        self.trades.read().await.clone()
    }

    /// Newest entry first, the order the dashboard shows
    pub async fn sorted_by_entry_time(&self) -> Vec<Trade> {
        let mut trades = self.all().await;
        trades.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
        trades
    }

    pub async fn len(&self) -> usize {
        self.trades.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trades.read().await.is_empty()
    }

    /// Merge server trades into the collection
    pub async fn sync(&self, remote: &[Trade], strategy: &dyn MergeStrategy<Trade>) {
        let mut trades = self.trades.write().await;
        *trades = reconcile(trades.as_slice(), remote, strategy);
    }

    pub async fn clear(&self) {
        self.trades.write().await.clear();
    }
}
