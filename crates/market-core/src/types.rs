use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked asset's market snapshot.
///
/// Every numeric field is independently optional; providers routinely omit
/// them for thinly traded coins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Provider identifier, stable across refreshes.
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub current_price: Option<f64>,
    /// 24h change in percent, signed.
    pub price_change_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub rank: Option<u32>,
}

impl Asset {
    /// Minimal asset with every numeric field absent.
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            current_price: None,
            price_change_24h: None,
            market_cap: None,
            total_volume: None,
            rank: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.current_price = Some(price);
        self
    }

    pub fn with_change(mut self, change: f64) -> Self {
        self.price_change_24h = Some(change);
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    /// Direction of the 24h move, if known.
    pub fn trend(&self) -> Option<Trend> {
        self.price_change_24h.map(|c| {
            if c > 0.0 {
                Trend::Up
            } else if c < 0.0 {
                Trend::Down
            } else {
                Trend::Flat
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Where an insight's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightOrigin {
    Generated,
    Fallback,
}

/// Short text about one asset, shown until replaced or dismissed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub asset_name: String,
    pub text: String,
    pub origin: InsightOrigin,
    pub created_at: DateTime<Utc>,
}

impl Insight {
    pub fn new(asset_name: impl Into<String>, text: impl Into<String>, origin: InsightOrigin) -> Self {
        Self {
            asset_name: asset_name.into(),
            text: text.into(),
            origin,
            created_at: Utc::now(),
        }
    }
}
