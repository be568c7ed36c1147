use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Durable user records.
///
/// `insert_user` must reject a duplicate email with
/// [`DomainError::Conflict`](crate::domain::error::DomainError::Conflict) atomically,
/// so that of two concurrent inserts for the same email exactly one wins.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<User>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

pub const DEFAULT_CACHE_TTL_SECS: u64 = 50;

/// Process-wide response cache with lazy TTL expiry.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Returns the stored value unless it is missing or older than its TTL.
    async fn get(&self, key: &str) -> Option<Value>;
    /// Replaces any entry at `key` with a fresh one.
    async fn set(&self, key: String, value: Value, ttl_secs: u64);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
