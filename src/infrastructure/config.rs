use crate::data::upstream::{DEFAULT_ALPHA_VANTAGE_URL, DEFAULT_CHAT_COMPLETIONS_URL};
use crate::domain::repository::DEFAULT_CACHE_TTL_SECS;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEV_SECRET_KEY: &str = "dev-secret-change-me";
const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub alpha_vantage_key: Option<String>,
    pub alpha_vantage_url: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub groq_api_url: String,
    pub secret_key: String,
    pub cookie_secure: bool,
    pub session_ttl_secs: u64,
    pub cache_ttl_secs: u64,
    pub upstream_timeout_secs: u64,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

// Credentials stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("alpha_vantage_key", &self.alpha_vantage_key.as_ref().map(|_| "[REDACTED]"))
            .field("alpha_vantage_url", &self.alpha_vantage_url)
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("groq_model", &self.groq_model)
            .field("groq_api_url", &self.groq_api_url)
            .field("cookie_secure", &self.cookie_secure)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("database_url", &self.database_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("static_dir", &self.static_dir)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = match non_empty(&lookup, "SECRET_KEY") {
            Some(secret) => secret,
            None => {
                warn!("SECRET_KEY not set, falling back to the development secret");
                DEV_SECRET_KEY.to_string()
            }
        };

        Ok(Config {
            alpha_vantage_key: non_empty(&lookup, "ALPHAVANTAGE_KEY"),
            alpha_vantage_url: non_empty(&lookup, "ALPHAVANTAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ALPHA_VANTAGE_URL.to_string()),
            groq_api_key: non_empty(&lookup, "GROQ_API_KEY"),
            groq_model: non_empty(&lookup, "GROQ_MODEL")
                .unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            groq_api_url: non_empty(&lookup, "GROQ_API_URL")
                .unwrap_or_else(|| DEFAULT_CHAT_COMPLETIONS_URL.to_string()),
            secret_key,
            cookie_secure: parse_bool(&lookup, "COOKIE_SECURE", false)?,
            session_ttl_secs: parse_or(&lookup, "SESSION_TTL_SECS", 86_400)?,
            cache_ttl_secs: parse_or(&lookup, "CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
            upstream_timeout_secs: parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", 30)?,
            database_url: non_empty(&lookup, "DATABASE_URL")
                .unwrap_or_else(|| "sqlite://users.db".to_string()),
            host: non_empty(&lookup, "HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8000)?,
            static_dir: non_empty(&lookup, "STATIC_DIR").unwrap_or_else(|| "public".to_string()),
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup, name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, name) {
        Some(value) => match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert!(config.alpha_vantage_key.is_none());
        assert!(config.groq_api_key.is_none());
        assert_eq!(config.groq_model, "llama-3.1-8b-instant");
        assert_eq!(config.secret_key, DEV_SECRET_KEY);
        assert!(!config.cookie_secure);
        assert_eq!(config.cache_ttl_secs, 50);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(30));
        assert_eq!(config.port, 8000);
        assert_eq!(config.alpha_vantage_url, DEFAULT_ALPHA_VANTAGE_URL);
    }

    #[test]
    fn test_reads_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("ALPHAVANTAGE_KEY", "av-key"),
            ("GROQ_API_KEY", "groq-key"),
            ("SECRET_KEY", "s3cret"),
            ("COOKIE_SECURE", "TRUE"),
            ("PORT", "9090"),
            ("CACHE_TTL_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.alpha_vantage_key.as_deref(), Some("av-key"));
        assert_eq!(config.groq_api_key.as_deref(), Some("groq-key"));
        assert_eq!(config.secret_key, "s3cret");
        assert!(config.cookie_secure);
        assert_eq!(config.port, 9090);
        assert_eq!(config.cache_ttl_secs, 5);
    }

    #[test]
    fn test_blank_credentials_count_as_unset() {
        let config =
            Config::from_lookup(lookup_from(&[("ALPHAVANTAGE_KEY", "  "), ("GROQ_API_KEY", "")]))
                .unwrap();

        assert!(config.alpha_vantage_key.is_none());
        assert!(config.groq_api_key.is_none());
    }

    #[test]
    fn test_malformed_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_malformed_cookie_flag_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("COOKIE_SECURE", "maybe")])).is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = Config::from_lookup(lookup_from(&[
            ("ALPHAVANTAGE_KEY", "av-secret-value"),
            ("SECRET_KEY", "signing-secret-value"),
        ]))
        .unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("av-secret-value"));
        assert!(!debug.contains("signing-secret-value"));
    }
}
