/**
 * Trade Data Structure
 *
 * Defines the journal's trade record, the partial patch used by update
 * mutations, and the profit/loss arithmetic. Records are serialized in the
 * camelCase layout the journal API speaks.
 */
use serde::{Deserialize, Serialize};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

/// Whether the position is still open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

/// Emotion captured around entry or exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmotionType {
    Fear,
    Greed,
    Calm,
    Frustration,
    Excitement,
    Boredom,
    Confidence,
    Doubt,
}

/// A tagged emotion with its intensity (1-10)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    #[serde(rename = "type")]
    pub kind: EmotionType,
    pub intensity: u8,
    pub timestamp: String,
}

impl Emotion {
    /// Emotion stamped with the current time at the default intensity of 5
    pub fn now(kind: EmotionType) -> Self {
        Self {
            kind,
            intensity: 5,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A single journal trade
///
/// `id` is the identity used by the local collection, the reconciliation
/// merge and every `/trades/{id}` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub user_id: String,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<String>,
    pub size: f64,
    pub conviction: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_reason: Option<String>,
    #[serde(default)]
    pub pre_entry_emotions: Vec<Emotion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_exit_emotions: Option<Vec<Emotion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_entry_journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_exit_journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl_percent: Option<f64>,
    pub status: TradeStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update applied to a trade; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_exit_emotions: Option<Vec<Emotion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_exit_journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conviction: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TradeStatus>,
}

impl TradeUpdate {
    /// Patch closing the position at `exit_price`
    pub fn close(exit_price: f64, exit_time: impl Into<String>) -> Self {
        Self {
            exit_price: Some(exit_price),
            exit_time: Some(exit_time.into()),
            status: Some(TradeStatus::Closed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Trade {
    /// Generate a client-side trade id: `trade_{millis}_{random}`
    pub fn generate_id() -> String {
        crate::shared::time_based_id("trade")
    }

    /// Create a new open trade stamped with the current time
    pub fn open(
        user_id: impl Into<String>,
        instrument: impl Into<String>,
        direction: Direction,
        entry_price: f64,
        size: f64,
        conviction: u8,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Self::generate_id(),
            user_id: user_id.into(),
            instrument: instrument.into(),
            direction,
            entry_price,
            entry_time: now.clone(),
            exit_price: None,
            exit_time: None,
            size,
            conviction,
            quick_reason: None,
            pre_entry_emotions: Vec::new(),
            post_exit_emotions: None,
            pre_entry_journal: None,
            post_exit_journal: None,
            exit_reason: None,
            screenshots: None,
            tags: None,
            pnl: None,
            pnl_percent: None,
            status: TradeStatus::Open,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Apply a partial update, recomputing P/L when the trade becomes closed
    pub fn apply(&mut self, update: &TradeUpdate) {
        if let Some(exit_price) = update.exit_price {
            self.exit_price = Some(exit_price);
        }
        if let Some(exit_time) = &update.exit_time {
            self.exit_time = Some(exit_time.clone());
        }
        if let Some(exit_reason) = &update.exit_reason {
            self.exit_reason = Some(exit_reason.clone());
        }
        if let Some(emotions) = &update.post_exit_emotions {
            self.post_exit_emotions = Some(emotions.clone());
        }
        if let Some(journal) = &update.post_exit_journal {
            self.post_exit_journal = Some(journal.clone());
        }
        if let Some(screenshots) = &update.screenshots {
            self.screenshots = Some(screenshots.clone());
        }
        if let Some(tags) = &update.tags {
            self.tags = Some(tags.clone());
        }
        if let Some(conviction) = update.conviction {
            self.conviction = conviction;
        }
        if let Some(status) = update.status {
            self.status = status;
        }

        if self.status == TradeStatus::Closed && self.exit_price.is_some() {
            self.pnl = Some(self.calculate_pnl());
            self.pnl_percent = Some(self.calculate_pnl_percent());
        }
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Absolute profit/loss; zero while the exit price is unknown
    pub fn calculate_pnl(&self) -> f64 {
        match self.price_diff() {
            Some(diff) => diff * self.size,
            None => 0.0,
        }
    }

    /// Profit/loss relative to the entry price, in percent
    pub fn calculate_pnl_percent(&self) -> f64 {
        match self.price_diff() {
            Some(diff) => (diff / self.entry_price) * 100.0,
            None => 0.0,
        }
    }

    fn price_diff(&self) -> Option<f64> {
        let exit = self.exit_price.filter(|p| *p != 0.0)?;
        if self.entry_price == 0.0 {
            return None;
        }
        Some(match self.direction {
            Direction::Long => exit - self.entry_price,
            Direction::Short => self.entry_price - exit,
        })
    }
}

/// Bundled trades the local collection starts from
pub fn sample_trades() -> Vec<Trade> {
    let mut eurusd = Trade::open("user1", "EURUSD", Direction::Long, 1.0850, 10_000.0, 7);
    eurusd.id = "sample_1".to_string();
    eurusd.quick_reason = Some("Breakout above resistance".to_string());
    eurusd.pre_entry_emotions = vec![Emotion::now(EmotionType::Confidence)];
    eurusd.apply(&TradeUpdate::close(1.0900, chrono::Utc::now().to_rfc3339()));

    let mut btc = Trade::open("user1", "BTCUSD", Direction::Short, 43_000.0, 0.5, 4);
    btc.id = "sample_2".to_string();
    btc.quick_reason = Some("Fading the spike".to_string());
    btc.pre_entry_emotions = vec![Emotion::now(EmotionType::Doubt)];

    vec![eurusd, btc]
}
