use async_trait::async_trait;
use market_core::{status_message, Asset, FetchFailure, MarketDataSource};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";

/// Query parameters sent on every markets request. The listing is always the
/// first 100 USD-quoted assets by market cap.
const MARKET_QUERY: [(&str, &str); 6] = [
    ("vs_currency", "usd"),
    ("order", "market_cap_desc"),
    ("per_page", "100"),
    ("page", "1"),
    ("sparkline", "false"),
    ("price_change_percentage", "24h"),
];

#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    markets_url: String,
}

impl CoinGeckoClient {
    pub fn new(markets_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            markets_url: markets_url.into(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MARKETS_URL, Duration::from_secs(15))
    }

    pub fn markets_url(&self) -> &str {
        &self.markets_url
    }

    /// Get the top assets by market cap. One request, no retry.
    pub async fn get_markets(&self, access_key: Option<&str>) -> Result<Vec<Asset>, FetchFailure> {
        let mut request = self.client.get(&self.markets_url).query(&MARKET_QUERY);
        if let Some(key) = access_key {
            request = request.query(&[("access_key", key)]);
        }

        tracing::debug!(
            "GET {} (access key {})",
            self.markets_url,
            if access_key.is_some() { "present" } else { "absent" }
        );

        let response = request
            .send()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        if !status.is_success() {
            let message = status_message(status.canonical_reason(), server_error_text(&body));
            tracing::warn!("Market data request failed: HTTP {} {}", status.as_u16(), message);
            return Err(FetchFailure::Status {
                status: status.as_u16(),
                message,
            });
        }

        parse_markets(&body)
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    async fn fetch(&self, access_key: Option<&str>) -> Result<Vec<Asset>, FetchFailure> {
        self.get_markets(access_key).await
    }
}

/// Project a markets response body onto [`Asset`]s, preserving order.
pub fn parse_markets(body: &str) -> Result<Vec<Asset>, FetchFailure> {
    let records: Vec<MarketRecord> =
        serde_json::from_str(body).map_err(|e| FetchFailure::Parse(e.to_string()))?;

    Ok(records.into_iter().map(Asset::from).collect())
}

/// Pull an error message out of the shapes the API uses for error bodies.
fn server_error_text(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let candidates = [
        value.get("error").and_then(|e| e.as_str()),
        value.pointer("/error/message").and_then(|m| m.as_str()),
        value.pointer("/status/error_message").and_then(|m| m.as_str()),
    ];

    let found = candidates.into_iter().flatten().next().map(str::to_string);
    found
}

// Response structures

#[derive(Debug, Deserialize)]
struct MarketRecord {
    id: String,
    name: String,
    symbol: String,
    current_price: Option<f64>,
    price_change_percentage_24h_in_currency: Option<f64>,
    // Older responses only carry the plain 24h figure.
    price_change_percentage_24h: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    market_cap_rank: Option<u32>,
}

impl From<MarketRecord> for Asset {
    fn from(r: MarketRecord) -> Self {
        Asset {
            id: r.id,
            name: r.name,
            symbol: r.symbol,
            current_price: r.current_price,
            price_change_24h: r
                .price_change_percentage_24h_in_currency
                .or(r.price_change_percentage_24h),
            market_cap: r.market_cap,
            total_volume: r.total_volume,
            rank: r.market_cap_rank,
        }
    }
}
