//! Persistence seam for accounts, sessions, stored API keys and doubt history.
//!
//! ARCHITECTURE
//! ============
//! Services talk to [`DoubtStore`] rather than to `PgPool` directly so the
//! solve pipeline and the HTTP routes can run in tests against the
//! in-memory store from `state::test_helpers`. [`PgStore`] is the production
//! implementation.
//!
//! TRADE-OFFS
//! ==========
//! Timestamps are formatted by Postgres (`to_char`, UTC, RFC 3339) so the
//! crate does not need a date-time library for display-only values.

use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::llm::{CredentialSet, ProviderName};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User already exists with this email")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Account plus its stored password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub profile: UserProfile,
    pub password_hash: String,
}

/// History row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoubt {
    pub user_id: Uuid,
    pub filename: Option<String>,
    pub subject: String,
    pub question_text: String,
    pub solution: String,
    pub provider: ProviderName,
}

/// History row as listed back to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoubtRecord {
    pub id: Uuid,
    pub filename: Option<String>,
    pub subject: String,
    pub question_text: String,
    pub solution: String,
    pub provider_used: String,
    pub created_at: String,
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait DoubtStore: Send + Sync {
    /// Insert a new account. Fails with [`StoreError::DuplicateEmail`] if
    /// the (normalized) email is taken.
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<UserProfile, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn touch_last_login(&self, user_id: Uuid) -> Result<(), StoreError>;

    async fn create_session(&self, user_id: Uuid, token: &str, ttl_days: i32) -> Result<(), StoreError>;

    /// Resolve a bearer token to its account, ignoring expired sessions.
    async fn session_user(&self, token: &str) -> Result<Option<UserProfile>, StoreError>;

    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;

    async fn api_keys(&self, user_id: Uuid) -> Result<CredentialSet, StoreError>;

    /// Upsert every entry of `keys`. Entries not present are left alone.
    async fn upsert_api_keys(&self, user_id: Uuid, keys: &CredentialSet) -> Result<(), StoreError>;

    async fn insert_doubt(&self, doubt: &NewDoubt) -> Result<(), StoreError>;

    /// Most recent first.
    async fn recent_doubts(&self, user_id: Uuid, limit: i64) -> Result<Vec<DoubtRecord>, StoreError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn profile_from_row(row: &sqlx::postgres::PgRow) -> UserProfile {
    UserProfile { id: row.get("id"), name: row.get("name"), email: row.get("email") }
}

#[async_trait::async_trait]
impl DoubtStore for PgStore {
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<UserProfile, StoreError> {
        let row = sqlx::query(
            r"INSERT INTO users (id, name, email, password_hash)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (email) DO NOTHING
              RETURNING id, name, email",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).ok_or(StoreError::DuplicateEmail)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query("SELECT id, name, email, password_hash FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| UserRecord { profile: profile_from_row(&r), password_hash: r.get("password_hash") }))
    }

    async fn touch_last_login(&self, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_session(&self, user_id: Uuid, token: &str, ttl_days: i32) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, now() + make_interval(days => $3))",
        )
        .bind(token)
        .bind(user_id)
        .bind(ttl_days)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn session_user(&self, token: &str) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query(
            r"SELECT u.id, u.name, u.email
              FROM sessions s
              JOIN users u ON u.id = s.user_id
              WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(profile_from_row))
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn api_keys(&self, user_id: Uuid) -> Result<CredentialSet, StoreError> {
        let rows = sqlx::query("SELECT provider, api_key FROM user_api_keys WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let pairs: Vec<(String, String)> = rows
            .iter()
            .map(|r| (r.get("provider"), r.get("api_key")))
            .collect();
        Ok(CredentialSet::from_pairs(pairs.iter().map(|(p, k)| (p.as_str(), k.as_str()))))
    }

    async fn upsert_api_keys(&self, user_id: Uuid, keys: &CredentialSet) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for (provider, key) in keys.iter() {
            sqlx::query(
                r"INSERT INTO user_api_keys (user_id, provider, api_key)
                  VALUES ($1, $2, $3)
                  ON CONFLICT (user_id, provider)
                  DO UPDATE SET api_key = EXCLUDED.api_key, updated_at = now()",
            )
            .bind(user_id)
            .bind(provider.as_str())
            .bind(key)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn insert_doubt(&self, doubt: &NewDoubt) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO doubts (id, user_id, filename, subject, question_text, solution, provider_used)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(doubt.user_id)
        .bind(&doubt.filename)
        .bind(&doubt.subject)
        .bind(&doubt.question_text)
        .bind(&doubt.solution)
        .bind(doubt.provider.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_doubts(&self, user_id: Uuid, limit: i64) -> Result<Vec<DoubtRecord>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, filename, subject, question_text, solution, provider_used,
                      to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
               FROM doubts d
               WHERE d.user_id = $1
               ORDER BY d.created_at DESC
               LIMIT $2"#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DoubtRecord {
                id: r.get("id"),
                filename: r.get("filename"),
                subject: r.get("subject"),
                question_text: r.get("question_text"),
                solution: r.get("solution"),
                provider_used: r.get("provider_used"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
