pub mod fallback;

pub use fallback::{fallback_text, FallbackSelector};

use async_trait::async_trait;
use market_core::{status_message, Insight, InsightFailure, InsightOrigin, InsightSource};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_INSIGHT_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    text: String,
}

impl GenerateRequest {
    fn for_asset(asset_name: &str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: prompt_for(asset_name),
                }],
            }],
        }
    }
}

pub fn prompt_for(asset_name: &str) -> String {
    format!(
        "Write a neutral 2-3 sentence summary of the cryptocurrency {asset_name}: \
         what it is and what role it plays in the market. \
         Do not give financial advice or price predictions."
    )
}

/// Two-tier insight retrieval: remote generation when a key is configured,
/// a canned template otherwise.
pub struct InsightClient {
    client: reqwest::Client,
    endpoint: String,
    selector: FallbackSelector,
}

impl InsightClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
            selector: FallbackSelector::default(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_INSIGHT_URL, Duration::from_secs(30))
    }

    /// Replace the fallback template selector.
    pub fn with_selector(mut self, selector: FallbackSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Get an insight for `asset_name`. Without a key this never fails.
    pub async fn request(
        &self,
        asset_name: &str,
        access_key: Option<&str>,
    ) -> Result<Insight, InsightFailure> {
        match access_key {
            None => Ok(self.fallback(asset_name)),
            Some(key) => self.generate(asset_name, key).await,
        }
    }

    pub fn fallback(&self, asset_name: &str) -> Insight {
        let index = self.selector.next_index();
        tracing::debug!("Using fallback insight template {} for {}", index, asset_name);
        Insight::new(asset_name, fallback_text(asset_name, index), InsightOrigin::Fallback)
    }

    async fn generate(&self, asset_name: &str, key: &str) -> Result<Insight, InsightFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key)])
            .json(&GenerateRequest::for_asset(asset_name))
            .send()
            .await
            .map_err(|e| InsightFailure::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InsightFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            let server_text = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                });
            let message = status_message(status.canonical_reason(), server_text);
            tracing::warn!("Insight request for {} failed: HTTP {} {}", asset_name, status.as_u16(), message);
            return Err(InsightFailure::Status {
                status: status.as_u16(),
                message,
            });
        }

        let text = extract_text(&body).ok_or_else(|| {
            tracing::warn!("Insight response for {} had no candidate text", asset_name);
            InsightFailure::MissingText
        })?;

        Ok(Insight::new(asset_name, text, InsightOrigin::Generated))
    }
}

#[async_trait]
impl InsightSource for InsightClient {
    async fn request(&self, asset_name: &str, access_key: Option<&str>) -> Result<Insight, InsightFailure> {
        InsightClient::request(self, asset_name, access_key).await
    }
}

/// First generated text fragment, if the response has the expected shape.
pub fn extract_text(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
