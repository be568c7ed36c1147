//! HTTP clients for the market-data and chat-completion providers.

use crate::domain::error::DomainError;
use crate::domain::market::{ChatCompletionRequest, UpstreamQuery, UpstreamResponse};
use crate::domain::provider::{InsightProvider, MarketDataProvider};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(client)
}

pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
}

impl AlphaVantageClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageClient {
    #[instrument(skip(self, api_key), fields(function = query.get("function").unwrap_or_default()))]
    async fn fetch(&self, query: &UpstreamQuery, api_key: &str) -> Result<UpstreamResponse> {
        let mut params: Vec<(&str, &str)> = query.pairs().collect();
        params.push(("apikey", api_key));

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Market-data request failed");
                DomainError::Upstream("Market data provider unavailable".to_string())
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read market-data response body");
            DomainError::Upstream("Market data provider unavailable".to_string())
        })?;
        debug!(status = status, bytes = body.len(), "Market-data response received");

        Ok(UpstreamResponse { status, body })
    }
}

pub struct ChatCompletionClient {
    client: Client,
    endpoint: String,
}

impl ChatCompletionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl InsightProvider for ChatCompletionClient {
    #[instrument(skip(self, request, api_key), fields(model = %request.model))]
    async fn complete(&self, request: &ChatCompletionRequest, api_key: &str) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.json::<Value>().await?;
        debug!(status = %status, "Chat completion response received");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_market_provider_is_upstream_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let client =
            AlphaVantageClient::new("http://127.0.0.1:9/query", Duration::from_secs(2)).unwrap();
        let query = UpstreamQuery::new("GLOBAL_QUOTE").with("symbol", "IBM");

        let err = client.fetch(&query, "key").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_chat_provider_is_error() {
        let client =
            ChatCompletionClient::new("http://127.0.0.1:9/chat", Duration::from_secs(2)).unwrap();
        let request = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![],
            temperature: 0.3,
            max_tokens: 1,
        };

        assert!(client.complete(&request, "key").await.is_err());
    }
}
