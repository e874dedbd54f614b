use async_trait::async_trait;
use crate::{Asset, FetchFailure, Insight, InsightFailure};

/// Source of the ranked asset list.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch(&self, access_key: Option<&str>) -> Result<Vec<Asset>, FetchFailure>;
}

/// Source of short natural-language asset summaries.
#[async_trait]
pub trait InsightSource: Send + Sync {
    async fn request(&self, asset_name: &str, access_key: Option<&str>) -> Result<Insight, InsightFailure>;
}
