//! LLM types: provider names, credential sets, image payloads and errors.
//!
//! Provider-neutral types shared by the Gemini, Anthropic and `OpenAI`
//! bindings and by the selector in `services::selector`.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// Placeholder returned when a provider answers without any text. Never
/// recorded in history.
pub const NO_SOLUTION_TEXT: &str = "No solution generated";

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by provider bindings and the registry.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// No binding is registered for the selected provider.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(ProviderName),

    /// The HTTP request to the provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The provider did not answer within the request budget.
    #[error("provider call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::ProviderUnavailable(_) => "E_PROVIDER_UNAVAILABLE",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::Timeout { .. } => "E_PROVIDER_TIMEOUT",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

// =============================================================================
// PROVIDER NAME
// =============================================================================

/// External LLM vendors a credential can belong to.
///
/// `Other` is accepted as configuration and stored like the rest, but the
/// selector never picks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Gemini,
    Anthropic,
    OpenAi,
    Other,
}

impl ProviderName {
    /// Every provider slot, in display order.
    pub const ALL: [Self; 4] = [Self::Gemini, Self::Anthropic, Self::OpenAi, Self::Other];

    /// Auto-selection priority. `Other` is deliberately absent.
    pub const SELECTION_ORDER: [Self; 3] = [Self::Gemini, Self::Anthropic, Self::OpenAi];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Other => "other",
        }
    }

    /// Parse a wire name. Case-insensitive, surrounding whitespace ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "anthropic" => Some(Self::Anthropic),
            "openai" => Some(Self::OpenAi),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CREDENTIAL SET
// =============================================================================

/// Provider name → API key. Only non-empty (trimmed) keys are kept, so a
/// present entry always means "configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialSet(BTreeMap<ProviderName, String>);

impl CredentialSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key. Blank keys are ignored and leave any existing entry intact.
    pub fn insert(&mut self, provider: ProviderName, key: &str) {
        let key = key.trim();
        if !key.is_empty() {
            self.0.insert(provider, key.to_owned());
        }
    }

    /// Builder form of [`CredentialSet::insert`].
    #[must_use]
    pub fn with(mut self, provider: ProviderName, key: &str) -> Self {
        self.insert(provider, key);
        self
    }

    #[must_use]
    pub fn get(&self, provider: ProviderName) -> Option<&str> {
        self.0.get(&provider).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProviderName, &str)> {
        self.0.iter().map(|(p, k)| (*p, k.as_str()))
    }

    /// Build from loosely typed pairs (request bodies, database rows).
    /// Unknown provider names and blank keys are dropped.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut set = Self::new();
        for (name, key) in pairs {
            if let Some(provider) = ProviderName::parse(name) {
                set.insert(provider, key);
            }
        }
        set
    }

    /// Parse the `apiKeys` JSON object sent by clients. Non-string values
    /// (e.g. `null`) count as not configured.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a JSON object.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let map: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)?;
        Ok(Self::from_pairs(
            map.iter()
                .filter_map(|(name, value)| value.as_str().map(|key| (name.as_str(), key))),
        ))
    }
}

// =============================================================================
// IMAGE INPUT
// =============================================================================

/// Media type assumed when the upload does not declare a usable one.
pub const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/jpeg";

/// Uploaded image bytes plus their declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl ImageInput {
    #[must_use]
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self { bytes, media_type: media_type.into() }
    }

    /// Standard base64 (with padding) as required by all three vendors.
    #[must_use]
    pub fn base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// `data:` URL form used by OpenAI-compatible APIs.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64())
    }
}

// =============================================================================
// PROVIDER ADAPTER TRAIT
// =============================================================================

/// Uniform call signature for one external LLM. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Send the image and prompt to the provider and return its raw text.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails, the provider answers
    /// with a non-success status, or the body is malformed.
    async fn invoke(&self, credential: &str, image: &ImageInput, prompt: &str) -> Result<String, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
