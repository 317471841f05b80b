//! Anthropic Messages API client.
//!
//! Thin HTTP wrapper for `/v1/messages` carrying one user turn with a
//! base64 image block followed by the prompt. Pure parsing in
//! `parse_response` for testability.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{LlmTimeouts, ProviderEndpoint};
use super::types::{ImageInput, LlmError, ProviderAdapter};

const API_VERSION: &str = "2023-06-01";

// =============================================================================
// CLIENT
// =============================================================================

pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: ProviderEndpoint,
    max_tokens: u32,
}

impl AnthropicClient {
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
}

#[async_trait::async_trait]
impl ProviderAdapter for AnthropicClient {
    async fn invoke(&self, credential: &str, image: &ImageInput, prompt: &str) -> Result<String, LlmError> {
        let data = image.base64();
        let body = ApiRequest {
            model: &self.endpoint.model,
            max_tokens: self.max_tokens,
            messages: vec![ApiMessage {
                role: "user",
                content: vec![
                    RequestBlock::Image {
                        source: ImageSource { source_type: "base64", media_type: &image.media_type, data: &data },
                    },
                    RequestBlock::Text { text: prompt },
                ],
            }],
        };

        let response = self
            .http
            .post(format!("{}/messages", self.endpoint.base_url))
            .header("x-api-key", credential)
            .header("anthropic-version", API_VERSION)
            .json(&body)
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

        parse_response(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: Vec<RequestBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RequestBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ResponseBlock>,
}

/// Only text blocks matter here; thinking and future block types are skipped.
#[derive(Deserialize)]
#[serde(tag = "type")]
enum ResponseBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Unknown,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_response(json: &str) -> Result<String, LlmError> {
    let api: ApiResponse = serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;

    let parts: Vec<String> = api
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(text),
            ResponseBlock::Unknown => None,
        })
        .collect();

    if parts.is_empty() {
        return Err(LlmError::ApiParse("response contained no text blocks".into()));
    }
    Ok(parts.join("\n"))
}

#[cfg(test)]
#[path = "anthropic_test.rs"]
mod tests;
