use crate::domain::error::DomainError;
use crate::domain::market::{
    ChatCompletionRequest, ChatMessage, FUNCTION_GLOBAL_QUOTE, FUNCTION_INTRADAY,
    FUNCTION_SYMBOL_SEARCH, Insight, MarketPayload, UpstreamQuery,
};
use crate::domain::provider::{InsightProvider, MarketDataProvider};
use crate::domain::repository::ResponseCache;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_SYMBOL: &str = "RELIANCE.BSE";
pub const DEFAULT_INTERVAL: &str = "5min";
pub const DEFAULT_SEARCH_QUERY: &str = "TCS";
const INTRADAY_OUTPUT_SIZE: &str = "compact";

pub const INSIGHT_NOT_CONFIGURED: &str = "AI insight unavailable (GROQ_API_KEY not set).";
pub const INSIGHT_UNAVAILABLE: &str = "Insight temporarily unavailable.";

const INSIGHT_SYSTEM_PROMPT: &str =
    "You are a concise market explainer. Keep responses under 80 words. No financial advice.";
const INSIGHT_TEMPERATURE: f32 = 0.3;
const INSIGHT_MAX_TOKENS: u32 = 120;

pub struct MarketSettings {
    pub market_api_key: Option<String>,
    pub insight_api_key: Option<String>,
    pub insight_model: String,
    pub cache_ttl_secs: u64,
}

pub struct MarketService {
    cache: Arc<dyn ResponseCache>,
    market: Arc<dyn MarketDataProvider>,
    insight: Arc<dyn InsightProvider>,
    settings: MarketSettings,
}

impl MarketService {
    pub fn new(
        cache: Arc<dyn ResponseCache>,
        market: Arc<dyn MarketDataProvider>,
        insight: Arc<dyn InsightProvider>,
        settings: MarketSettings,
    ) -> Self {
        Self {
            cache,
            market,
            insight,
            settings,
        }
    }

    pub async fn quote(&self, symbol: &str) -> Result<MarketPayload> {
        let query = UpstreamQuery::new(FUNCTION_GLOBAL_QUOTE).with("symbol", symbol);
        self.fetch_cached(query).await
    }

    pub async fn intraday(&self, symbol: &str, interval: &str) -> Result<MarketPayload> {
        let query = UpstreamQuery::new(FUNCTION_INTRADAY)
            .with("symbol", symbol)
            .with("interval", interval)
            .with("outputsize", INTRADAY_OUTPUT_SIZE);
        self.fetch_cached(query).await
    }

    pub async fn search(&self, keywords: &str) -> Result<MarketPayload> {
        let query = UpstreamQuery::new(FUNCTION_SYMBOL_SEARCH).with("keywords", keywords);
        self.fetch_cached(query).await
    }

    /// Cache-first fetch. Only well-formed JSON is cached; anything else is
    /// passed through untouched, and nothing is retried.
    #[instrument(skip(self, query), fields(key))]
    async fn fetch_cached(&self, query: UpstreamQuery) -> Result<MarketPayload> {
        let Some(api_key) = self.settings.market_api_key.as_deref() else {
            warn!("Market data requested without ALPHAVANTAGE_KEY");
            return Err(DomainError::Configuration("ALPHAVANTAGE_KEY missing".to_string()).into());
        };

        let key = query.cache_key();
        tracing::Span::current().record("key", key.as_str());

        if let Some(body) = self.cache.get(&key).await {
            debug!("Serving market data from cache");
            return Ok(MarketPayload::Json {
                status: 200,
                body,
                cached: true,
            });
        }

        let response = self.market.fetch(&query, api_key).await?;
        match serde_json::from_str::<Value>(&response.body) {
            Ok(body) => {
                self.cache
                    .set(key, body.clone(), self.settings.cache_ttl_secs)
                    .await;
                info!(status = response.status, "Market data fetched and cached");
                Ok(MarketPayload::Json {
                    status: response.status,
                    body,
                    cached: false,
                })
            }
            Err(_) => {
                warn!(status = response.status, "Provider returned a non-JSON body");
                Ok(MarketPayload::Text {
                    status: response.status,
                    body: response.body,
                })
            }
        }
    }

    /// Best-effort AI summary. Never fails: a missing credential or any
    /// provider problem yields a fixed message instead.
    #[instrument(skip(self))]
    pub async fn insight(&self, symbol: &str) -> Insight {
        let Some(api_key) = self.settings.insight_api_key.as_deref() else {
            debug!("GROQ_API_KEY not set, returning degraded insight");
            return Insight {
                summary: INSIGHT_NOT_CONFIGURED.to_string(),
            };
        };

        let request = ChatCompletionRequest {
            model: self.settings.insight_model.clone(),
            messages: vec![
                ChatMessage::system(INSIGHT_SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Give a short, neutral summary for {}. Mention near-term trend risks and catalysts (no numbers).",
                    symbol
                )),
            ],
            temperature: INSIGHT_TEMPERATURE,
            max_tokens: INSIGHT_MAX_TOKENS,
        };

        let summary = match self.insight.complete(&request, api_key).await {
            Ok(body) => extract_completion_text(&body).unwrap_or_else(|| {
                warn!("Insight response had an unexpected shape");
                INSIGHT_UNAVAILABLE.to_string()
            }),
            Err(e) => {
                warn!(error = %e, "Insight provider call failed");
                INSIGHT_UNAVAILABLE.to_string()
            }
        };

        Insight { summary }
    }
}

fn extract_completion_text(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
}
