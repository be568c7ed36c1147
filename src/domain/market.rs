use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const FUNCTION_GLOBAL_QUOTE: &str = "GLOBAL_QUOTE";
pub const FUNCTION_INTRADAY: &str = "TIME_SERIES_INTRADAY";
pub const FUNCTION_SYMBOL_SEARCH: &str = "SYMBOL_SEARCH";

const CACHE_KEY_PREFIX: &str = "alpha:";

/// Parameters of one market-data call, excluding the credential.
///
/// Stored sorted by name, so two queries built from the same pairs in any order
/// produce the same [`UpstreamQuery::cache_key`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpstreamQuery {
    params: BTreeMap<String, String>,
}

impl UpstreamQuery {
    pub fn new(function: &str) -> Self {
        Self::default().with("function", function)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn cache_key(&self) -> String {
        let joined = self
            .pairs()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}{}", CACHE_KEY_PREFIX, joined)
    }
}

/// Raw answer from the market-data provider before JSON detection.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// What a market endpoint hands back to the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketPayload {
    Json {
        status: u16,
        body: Value,
        cached: bool,
    },
    /// Non-JSON provider body, passed through with the provider's status.
    Text { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_ignores_argument_order() {
        let a = UpstreamQuery::from_pairs([
            ("function", "TIME_SERIES_INTRADAY"),
            ("symbol", "IBM"),
            ("interval", "5min"),
        ]);
        let b = UpstreamQuery::new(FUNCTION_INTRADAY)
            .with("interval", "5min")
            .with("symbol", "IBM");

        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_format() {
        let query = UpstreamQuery::new(FUNCTION_GLOBAL_QUOTE).with("symbol", "TCS.BSE");
        assert_eq!(query.cache_key(), "alpha:function=GLOBAL_QUOTE&symbol=TCS.BSE");
    }

    #[test]
    fn test_cache_key_differs_by_value() {
        let a = UpstreamQuery::new(FUNCTION_GLOBAL_QUOTE).with("symbol", "IBM");
        let b = UpstreamQuery::new(FUNCTION_GLOBAL_QUOTE).with("symbol", "MSFT");
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_with_overwrites_existing_param() {
        let query = UpstreamQuery::new(FUNCTION_SYMBOL_SEARCH)
            .with("keywords", "tcs")
            .with("keywords", "infy");
        assert_eq!(query.get("keywords"), Some("infy"));
        assert_eq!(query.pairs().count(), 2);
    }

    #[test]
    fn test_chat_request_serializes_expected_shape() {
        let req = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            temperature: 0.5,
            max_tokens: 10,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
        assert_eq!(json["max_tokens"], 10);
    }
}
