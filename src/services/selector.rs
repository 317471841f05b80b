//! Provider selection.
//!
//! Pure functions: merge stored and caller-supplied credentials, then pick
//! the first configured provider in fixed priority order.

use crate::error::ErrorCode;
use crate::llm::{CredentialSet, ProviderName};

#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("No API keys provided. Please configure at least one LLM API key.")]
    NoCredentialsConfigured,
}

impl ErrorCode for SelectError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoCredentialsConfigured => "E_NO_CREDENTIALS",
        }
    }

    fn status(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::BAD_REQUEST
    }
}

/// Start from `stored` and overlay every configured entry of `supplied`.
/// A blank supplied key never erases a stored one.
#[must_use]
pub fn merge_credentials(stored: &CredentialSet, supplied: &CredentialSet) -> CredentialSet {
    let mut effective = stored.clone();
    for (provider, key) in supplied.iter() {
        effective.insert(provider, key);
    }
    effective
}

/// Pick the provider to call and the key to call it with.
///
/// # Errors
///
/// Returns [`SelectError::NoCredentialsConfigured`] when none of the
/// selectable providers has a key.
pub fn resolve_provider(effective: &CredentialSet) -> Result<(ProviderName, String), SelectError> {
    ProviderName::SELECTION_ORDER
        .into_iter()
        .find_map(|provider| effective.get(provider).map(|key| (provider, key.to_owned())))
        .ok_or(SelectError::NoCredentialsConfigured)
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;
