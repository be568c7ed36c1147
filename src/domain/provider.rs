use crate::domain::market::{ChatCompletionRequest, UpstreamQuery, UpstreamResponse};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Third-party quote/series/search API.
///
/// Implementations return whatever status and body the provider sent; only
/// transport failures (unreachable, timeout) are errors.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(&self, query: &UpstreamQuery, api_key: &str) -> Result<UpstreamResponse>;
}

/// Chat-completion API used for the decorative insight text.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest, api_key: &str) -> Result<Value>;
}
