//! Placeholder binding for providers whose integration is not live yet.
//!
//! Answers every call successfully with a fixed notice. The notice flows
//! through segmentation and rendering like any other solution text.

use super::types::{ImageInput, LlmError, ProviderAdapter, ProviderName};

pub struct PendingProvider {
    name: ProviderName,
}

impl PendingProvider {
    #[must_use]
    pub fn new(name: ProviderName) -> Self {
        Self { name }
    }

    /// "Anthropic API integration coming soon", etc.
    #[must_use]
    pub fn notice(&self) -> String {
        format!("{} API integration coming soon", display_name(self.name))
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for PendingProvider {
    async fn invoke(&self, _credential: &str, _image: &ImageInput, _prompt: &str) -> Result<String, LlmError> {
        tracing::debug!(provider = %self.name, "pending provider answered with placeholder");
        Ok(self.notice())
    }
}

/// Human-facing vendor name.
#[must_use]
pub fn display_name(name: ProviderName) -> &'static str {
    match name {
        ProviderName::Gemini => "Gemini",
        ProviderName::Anthropic => "Anthropic",
        ProviderName::OpenAi => "OpenAI",
        ProviderName::Other => "Other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pending_returns_notice_without_network() {
        let stub = PendingProvider::new(ProviderName::Anthropic);
        let image = ImageInput::new(vec![1, 2, 3], "image/png");
        let text = stub.invoke("sk-ant", &image, "prompt").await.unwrap();
        assert_eq!(text, "Anthropic API integration coming soon");
    }

    #[test]
    fn openai_notice_uses_vendor_casing() {
        assert_eq!(PendingProvider::new(ProviderName::OpenAi).notice(), "OpenAI API integration coming soon");
    }
}
