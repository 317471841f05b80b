//! OpenAI-compatible Chat Completions client.
//!
//! Sends one user message whose content is a text part plus an `image_url`
//! part carrying the upload as a `data:` URL. Works against any base URL
//! that speaks `/chat/completions`.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::config::{LlmTimeouts, ProviderEndpoint};
use super::types::{ImageInput, LlmError, ProviderAdapter};

pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: ProviderEndpoint,
    max_tokens: u32,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: ProviderEndpoint, max_tokens: u32, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, endpoint, max_tokens })
    }

    async fn send_json(&self, credential: &str, path: &str, body: &impl Serialize) -> Result<String, LlmError> {
        let url = format!("{}{}", self.endpoint.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(credential)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for OpenAiClient {
    async fn invoke(&self, credential: &str, image: &ImageInput, prompt: &str) -> Result<String, LlmError> {
        let data_url = image.data_url();
        let body = CcRequest {
            model: &self.endpoint.model,
            max_tokens: self.max_tokens,
            messages: vec![CcMessage {
                role: "user",
                content: vec![CcPart::Text { text: prompt }, CcPart::ImageUrl { image_url: CcImageUrl { url: &data_url } }],
            }],
        };
        let text = self.send_json(credential, "/chat/completions", &body).await?;
        parse_chat_completions_response(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<CcMessage<'a>>,
}

#[derive(Serialize)]
struct CcMessage<'a> {
    role: &'static str,
    content: Vec<CcPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CcPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: CcImageUrl<'a> },
}

#[derive(Serialize)]
struct CcImageUrl<'a> {
    url: &'a str,
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

pub(crate) fn parse_chat_completions_response(json_text: &str) -> Result<String, LlmError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))?;

    let Some(choice) = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
    else {
        return Err(LlmError::ApiParse("chat_completions: missing choices[0]".to_string()));
    };

    let message = choice.get("message").unwrap_or(&Value::Null);
    if let Some(text) = message.get("content").and_then(Value::as_str) {
        if !text.is_empty() {
            return Ok(text.to_owned());
        }
    }

    if let Some(refusal) = message.get("refusal").and_then(Value::as_str) {
        return Ok(refusal.to_owned());
    }

    Err(LlmError::ApiParse("chat_completions: choices[0] has no text content".to_string()))
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
