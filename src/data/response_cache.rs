//! In-process TTL cache fronting the market-data provider.
//!
//! Entries are never swept. An entry older than its TTL reads as absent and is
//! replaced wholesale by the next `set` for the same key. There is no capacity
//! bound; the key space is the set of distinct symbol/interval/query
//! combinations actually requested.

use crate::domain::repository::{Clock, ResponseCache, SystemClock};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age_ms = now.signed_duration_since(self.created_at).num_milliseconds();
        let ttl_ms = i64::try_from(self.ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        age_ms <= ttl_ms
    }
}

#[derive(Clone)]
pub struct InMemoryResponseCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => {
                trace!(key = key, "Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(key = key, "Cache entry expired");
                None
            }
            None => {
                trace!(key = key, "Cache miss");
                None
            }
        }
    }

    async fn set(&self, key: String, value: Value, ttl_secs: u64) {
        let entry = CacheEntry {
            value,
            created_at: self.clock.now(),
            ttl_secs,
        };
        debug!(key = %key, ttl_secs = ttl_secs, "Storing cache entry");
        self.entries.write().await.insert(key, entry);
    }
}
