//! Bearer session tokens.
//!
//! ARCHITECTURE
//! ============
//! Login and registration mint a random 32-byte token stored in the
//! `sessions` table with an expiry. Every authenticated request presents it
//! as `Authorization: Bearer <token>` and is resolved back to its account
//! only while `expires_at > now()`.

use std::fmt::Write;

use rand::Rng;
use uuid::Uuid;

use super::store::{DoubtStore, StoreError, UserProfile};

pub const DEFAULT_SESSION_TTL_DAYS: i32 = 7;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Extract the token from an `Authorization` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Create a session for the given user, returning the token.
pub async fn create_session(store: &dyn DoubtStore, user_id: Uuid, ttl_days: i32) -> Result<String, StoreError> {
    let token = generate_token();
    store.create_session(user_id, &token, ttl_days).await?;
    Ok(token)
}

/// Validate a session token and return the associated user.
pub async fn validate_session(store: &dyn DoubtStore, token: &str) -> Result<Option<UserProfile>, StoreError> {
    store.session_user(token).await
}

/// Delete a session by token.
pub async fn delete_session(store: &dyn DoubtStore, token: &str) -> Result<(), StoreError> {
    store.delete_session(token).await
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
