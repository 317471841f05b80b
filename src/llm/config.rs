//! Provider configuration parsed from environment variables.

use super::types::{LlmError, ProviderName};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Where and what to call for one vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub gemini: ProviderEndpoint,
    pub anthropic: ProviderEndpoint,
    pub openai: ProviderEndpoint,
    pub max_tokens: u32,
    pub timeouts: LlmTimeouts,
    /// Providers bound to the "integration coming soon" stub instead of a
    /// real network client.
    pub pending: Vec<ProviderName>,
}

impl LlmConfig {
    /// Build typed provider config from environment variables. Every value
    /// is optional; API keys are never read here, they arrive per request.
    ///
    /// - `GEMINI_BASE_URL`, `GEMINI_MODEL`
    /// - `ANTHROPIC_BASE_URL`, `ANTHROPIC_MODEL`
    /// - `OPENAI_BASE_URL`, `OPENAI_MODEL`
    /// - `LLM_MAX_TOKENS`: default 4096
    /// - `LLM_REQUEST_TIMEOUT_SECS`: default 120
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10
    /// - `LLM_PENDING_PROVIDERS`: comma-separated provider names
    ///
    /// # Errors
    ///
    /// Returns an error if `LLM_PENDING_PROVIDERS` names an unknown provider.
    pub fn from_env() -> Result<Self, LlmError> {
        let pending = parse_pending(std::env::var("LLM_PENDING_PROVIDERS").ok().as_deref())?;

        Ok(Self {
            gemini: endpoint("GEMINI", DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL),
            anthropic: endpoint("ANTHROPIC", DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_MODEL),
            openai: endpoint("OPENAI", DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL),
            max_tokens: env_parse("LLM_MAX_TOKENS", DEFAULT_LLM_MAX_TOKENS),
            timeouts: LlmTimeouts {
                request_secs: env_parse("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
            },
            pending,
        })
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let endpoint = |base_url: &str, model: &str| ProviderEndpoint { base_url: base_url.into(), model: model.into() };
        Self {
            gemini: endpoint(DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL),
            anthropic: endpoint(DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_MODEL),
            openai: endpoint(DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL),
            max_tokens: DEFAULT_LLM_MAX_TOKENS,
            timeouts: LlmTimeouts {
                request_secs: DEFAULT_LLM_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_LLM_CONNECT_TIMEOUT_SECS,
            },
            pending: Vec::new(),
        }
    }
}

fn endpoint(prefix: &str, default_base_url: &str, default_model: &str) -> ProviderEndpoint {
    let base_url = std::env::var(format!("{prefix}_BASE_URL"))
        .unwrap_or_else(|_| default_base_url.to_string())
        .trim_end_matches('/')
        .to_string();
    let model = std::env::var(format!("{prefix}_MODEL")).unwrap_or_else(|_| default_model.to_string());
    ProviderEndpoint { base_url, model }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_pending(raw: Option<&str>) -> Result<Vec<ProviderName>, LlmError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut pending = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let provider = ProviderName::parse(name)
            .ok_or_else(|| LlmError::ConfigParse(format!("unknown provider in LLM_PENDING_PROVIDERS: {name}")))?;
        if !pending.contains(&provider) {
            pending.push(provider);
        }
    }
    Ok(pending)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
