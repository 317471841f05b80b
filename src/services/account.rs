//! Account registration and password login.
//!
//! Passwords are stored as bcrypt hashes (`$2b$<cost>$...`). The cost is
//! embedded in the hash, so raising [`BCRYPT_COST`] does not invalidate
//! existing accounts.

use axum::http::StatusCode;

use super::session;
use super::store::{DoubtStore, StoreError, UserProfile};
use crate::error::ErrorCode;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const BCRYPT_COST: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("User already exists with this email")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            other => Self::Store(other),
        }
    }
}

impl ErrorCode for AccountError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::DuplicateEmail => "E_DUPLICATE_EMAIL",
            Self::InvalidCredentials => "E_INVALID_CREDENTIALS",
            Self::Hash(_) => "E_PASSWORD_HASH",
            Self::Store(_) => "E_STORE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Hash(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
}

// =============================================================================
// VALIDATION
// =============================================================================

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || normalized.contains(char::is_whitespace) {
        return None;
    }
    Some(normalized)
}

fn validate_registration(name: &str, email: &str, password: &str) -> Result<String, AccountError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }
    let normalized = normalize_email(email);
    if normalized.is_none() {
        errors.push("Valid email is required".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
    }
    match normalized {
        Some(email) if errors.is_empty() => Ok(email),
        _ => Err(AccountError::Validation(errors)),
    }
}

// =============================================================================
// PASSWORD HASHING
// =============================================================================

/// Hash `password` with bcrypt at [`BCRYPT_COST`].
///
/// # Errors
///
/// Returns [`AccountError::Hash`] if bcrypt rejects the input.
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| AccountError::Hash(e.to_string()))
}

/// Check a password against a stored bcrypt hash. Malformed hashes never
/// verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

/// bcrypt is CPU-bound; run it off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, AccountError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AccountError::Hash(e.to_string()))
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Create an account and log it in.
///
/// # Errors
///
/// Returns [`AccountError::Validation`] with every failed rule,
/// [`AccountError::DuplicateEmail`] when the email is taken, or a store
/// error.
pub async fn register(
    store: &dyn DoubtStore,
    name: &str,
    email: &str,
    password: &str,
    ttl_days: i32,
) -> Result<AuthSession, AccountError> {
    let email = validate_registration(name, email, password)?;
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AccountError::DuplicateEmail);
    }

    let password = password.to_owned();
    let password_hash = run_blocking(move || hash_password(&password)).await??;
    let user = store.create_user(name.trim(), &email, &password_hash).await?;
    let token = session::create_session(store, user.id, ttl_days).await?;
    tracing::info!(user_id = %user.id, "account registered");
    Ok(AuthSession { user, token })
}

/// Verify credentials, stamp `last_login` and open a session.
///
/// # Errors
///
/// Returns [`AccountError::InvalidCredentials`] for an unknown email or a
/// wrong password, or a store error.
pub async fn login(
    store: &dyn DoubtStore,
    email: &str,
    password: &str,
    ttl_days: i32,
) -> Result<AuthSession, AccountError> {
    let mut errors = Vec::new();
    let normalized = normalize_email(email);
    if normalized.is_none() {
        errors.push("Valid email is required".to_string());
    }
    if password.is_empty() {
        errors.push("Password is required".to_string());
    }
    let Some(email) = normalized.filter(|_| errors.is_empty()) else {
        return Err(AccountError::Validation(errors));
    };

    let Some(record) = store.find_user_by_email(&email).await? else {
        return Err(AccountError::InvalidCredentials);
    };
    let (password, stored) = (password.to_owned(), record.password_hash.clone());
    if !run_blocking(move || verify_password(&password, &stored)).await? {
        return Err(AccountError::InvalidCredentials);
    }

    store.touch_last_login(record.profile.id).await?;
    let token = session::create_session(store, record.profile.id, ttl_days).await?;
    tracing::info!(user_id = %record.profile.id, "login succeeded");
    Ok(AuthSession { user: record.profile, token })
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
