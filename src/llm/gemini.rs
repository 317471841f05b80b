//! Google Gemini `generateContent` client.
//!
//! Thin HTTP wrapper: one user turn with the prompt as a text part and the
//! upload as an inline base64 blob. Pure parsing in `parse_response` for
//! testability.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{LlmTimeouts, ProviderEndpoint};
use super::types::{ImageInput, LlmError, NO_SOLUTION_TEXT, ProviderAdapter};

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: ProviderEndpoint,
    max_tokens: u32,
}

impl GeminiClient {
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

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint.base_url, self.endpoint.model)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for GeminiClient {
    async fn invoke(&self, credential: &str, image: &ImageInput, prompt: &str) -> Result<String, LlmError> {
        let body = build_request(image, prompt, self.max_tokens);

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", credential)
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
struct ApiRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Serialize)]
struct Blob {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn build_request(image: &ImageInput, prompt: &str, max_tokens: u32) -> ApiRequest {
    ApiRequest {
        contents: vec![RequestContent {
            role: "user",
            parts: vec![
                RequestPart::Text { text: prompt.to_owned() },
                RequestPart::InlineData {
                    inline_data: Blob { mime_type: image.media_type.clone(), data: image.base64() },
                },
            ],
        }],
        generation_config: GenerationConfig { max_output_tokens: max_tokens },
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Concatenate the text parts of the first candidate.
fn parse_response(json: &str) -> Result<String, LlmError> {
    let api: ApiResponse = serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;

    let text: String = api
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Ok(NO_SOLUTION_TEXT.to_owned());
    }
    Ok(text)
}

#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;
