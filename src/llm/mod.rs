//! LLM: per-vendor adapters behind one call signature.
//!
//! DESIGN
//! ======
//! Each vendor binding implements [`ProviderAdapter`]. The
//! [`ProviderRegistry`] maps a [`ProviderName`] to its binding and enforces
//! the overall request budget, so callers never branch on vendor. Bindings
//! for providers listed in `LLM_PENDING_PROVIDERS` are replaced by
//! [`pending::PendingProvider`]. `Other` is never bound.

pub mod anthropic;
pub mod config;
pub mod gemini;
pub mod openai;
pub mod pending;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use config::LlmConfig;
pub use types::{CredentialSet, ImageInput, LlmError, ProviderAdapter, ProviderName};

// =============================================================================
// REGISTRY
// =============================================================================

/// Provider name → binding, plus the end-to-end request budget.
pub struct ProviderRegistry {
    bindings: HashMap<ProviderName, Arc<dyn ProviderAdapter>>,
    request_timeout: Duration,
}

impl ProviderRegistry {
    /// Empty registry with the given per-call budget.
    #[must_use]
    pub fn new(request_timeout: Duration) -> Self {
        Self { bindings: HashMap::new(), request_timeout }
    }

    /// Build real network bindings for Gemini, Anthropic and `OpenAI`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let mut registry = Self::new(Duration::from_secs(config.timeouts.request_secs));

        for provider in ProviderName::SELECTION_ORDER {
            let binding: Arc<dyn ProviderAdapter> = if config.pending.contains(&provider) {
                Arc::new(pending::PendingProvider::new(provider))
            } else {
                match provider {
                    ProviderName::Gemini => Arc::new(gemini::GeminiClient::new(
                        config.gemini.clone(),
                        config.max_tokens,
                        config.timeouts,
                    )?),
                    ProviderName::Anthropic => Arc::new(anthropic::AnthropicClient::new(
                        config.anthropic.clone(),
                        config.max_tokens,
                        config.timeouts,
                    )?),
                    ProviderName::OpenAi => Arc::new(openai::OpenAiClient::new(
                        config.openai.clone(),
                        config.max_tokens,
                        config.timeouts,
                    )?),
                    ProviderName::Other => continue,
                }
            };
            registry.bindings.insert(provider, binding);
        }

        tracing::info!(
            gemini_model = %config.gemini.model,
            anthropic_model = %config.anthropic.model,
            openai_model = %config.openai.model,
            pending = ?config.pending,
            "provider registry ready"
        );
        Ok(registry)
    }

    /// Replace or add a binding. Used by tests to install mocks.
    #[must_use]
    pub fn with_binding(mut self, provider: ProviderName, binding: Arc<dyn ProviderAdapter>) -> Self {
        self.bindings.insert(provider, binding);
        self
    }

    #[must_use]
    pub fn is_bound(&self, provider: ProviderName) -> bool {
        self.bindings.contains_key(&provider)
    }

    /// Invoke the binding for `provider` within the request budget.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ProviderUnavailable`] when nothing is bound,
    /// [`LlmError::Timeout`] when the budget expires, or whatever the
    /// binding itself returns.
    pub async fn invoke(
        &self,
        provider: ProviderName,
        credential: &str,
        image: &ImageInput,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let binding = self
            .bindings
            .get(&provider)
            .ok_or(LlmError::ProviderUnavailable(provider))?;

        match tokio::time::timeout(self.request_timeout, binding.invoke(credential, image, prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout { secs: self.request_timeout.as_secs() }),
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
