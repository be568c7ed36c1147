use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, instrument, trace, warn};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// User store backed by a SQLite database. The `UNIQUE` email column is what
/// serialises concurrent signups.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database at `url` and ensures the schema exists.
    #[instrument]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        let repository = Self::new(pool);
        repository.init_schema().await?;
        info!("User store ready");
        Ok(repository)
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self, password_hash))]
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let created_at = Utc::now();
        let result =
            sqlx::query("INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?)")
                .bind(email)
                .bind(password_hash)
                .bind(created_at)
                .execute(&self.pool)
                .await;

        match result {
            Ok(done) => {
                let user = User {
                    id: done.last_insert_rowid(),
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    created_at,
                };
                debug!(user_id = user.id, email = %user.email, "User row inserted");
                Ok(user)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                warn!(email = email, "Unique constraint rejected duplicate email");
                Err(DomainError::Conflict("Email already registered.".to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        trace!("Querying users table by email");
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_repository() -> SqliteUserRepository {
        // A single connection keeps every query on the same in-memory database.
        SqliteUserRepository::connect("sqlite::memory:", 1)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let repo = memory_repository().await;

        let inserted = repo.insert_user("sql@example.com", "hash").await.unwrap();
        let found = repo
            .find_user_by_email("sql@example.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, inserted.id);
        assert_eq!(found.email, "sql@example.com");
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let repo = memory_repository().await;

        let a = repo.insert_user("a@example.com", "h").await.unwrap();
        let b = repo.insert_user("b@example.com", "h").await.unwrap();

        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = memory_repository().await;
        repo.insert_user("dup@example.com", "h1").await.unwrap();

        let err = repo.insert_user("dup@example.com", "h2").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_find_missing_user_returns_none() {
        let repo = memory_repository().await;
        let found = repo.find_user_by_email("ghost@example.com").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let repo = memory_repository().await;
        repo.init_schema().await.unwrap();
        repo.insert_user("again@example.com", "h").await.unwrap();
    }
}
