//! Solve pipeline: image + subject → provider → segmented, rendered solution.
//!
//! DESIGN
//! ======
//! One request flows through five stages, each owned by its own module:
//!
//! 1. merge caller-supplied credentials over the caller's stored ones and
//!    pick a provider (`selector`)
//! 2. invoke that provider once with the fixed tutor prompt (`llm`)
//! 3. segment the reply (`segment`)
//! 4. render the display document (`render`)
//! 5. record history for identified callers (`history`)
//!
//! There is no retry and no fallback to another provider: the first
//! configured provider in priority order either answers or fails the request.

use axum::http::StatusCode;
use tracing::{error, info, warn};

use super::history;
use super::render::render;
use super::segment::{SegmentedSolution, segment};
use super::selector::{SelectError, merge_credentials, resolve_provider};
use super::store::UserProfile;
use crate::error::ErrorCode;
use crate::llm::types::DEFAULT_IMAGE_MEDIA_TYPE;
use crate::llm::{CredentialSet, ImageInput, LlmError, ProviderName};
use crate::state::AppState;

pub const DEFAULT_SUBJECT: &str = "general";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    NoCredentials(#[from] SelectError),
    #[error("provider {0} is not available")]
    ProviderUnavailable(ProviderName),
    #[error("Failed to process your question. Please check your API keys and try again.")]
    ProviderCallFailed(#[source] LlmError),
}

impl ErrorCode for SolveError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::NoCredentials(e) => e.error_code(),
            Self::ProviderUnavailable(_) => "E_PROVIDER_UNAVAILABLE",
            Self::ProviderCallFailed(_) => "E_PROVIDER_CALL_FAILED",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NoCredentials(_) => StatusCode::BAD_REQUEST,
            Self::ProviderUnavailable(_) | Self::ProviderCallFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Everything a caller submits for one solve.
#[derive(Debug, Clone, Default)]
pub struct SolveRequest {
    /// `None` when no image part was uploaded.
    pub image: Option<ImageInput>,
    pub filename: Option<String>,
    pub subject: String,
    pub credentials: CredentialSet,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub provider: ProviderName,
    /// Provider text as returned.
    pub raw: String,
    pub sections: SegmentedSolution,
    /// Rendered HTML fragment.
    pub markup: String,
}

// =============================================================================
// PROMPT & INPUT NORMALIZATION
// =============================================================================

/// Blank subjects become `general`.
#[must_use]
pub fn normalize_subject(subject: Option<&str>) -> String {
    match subject.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_owned(),
        _ => DEFAULT_SUBJECT.to_owned(),
    }
}

/// Resolve the declared media type of an upload. Missing or generic types
/// fall back to JPEG.
///
/// # Errors
///
/// Returns [`SolveError::Validation`] for anything that is not `image/*`.
pub fn normalize_media_type(declared: Option<&str>) -> Result<String, SolveError> {
    let declared = declared.map(|m| m.trim().to_ascii_lowercase());
    match declared.as_deref() {
        None | Some("" | "application/octet-stream") => Ok(DEFAULT_IMAGE_MEDIA_TYPE.to_owned()),
        Some(m) if m.starts_with("image/") && m.len() > "image/".len() => Ok(m.to_owned()),
        Some(m) => Err(SolveError::Validation(format!("Unsupported file type: {m}. Please upload an image."))),
    }
}

#[must_use]
pub fn build_prompt(subject: &str) -> String {
    format!(
        "You are an expert tutor. Analyze this {subject} problem in the uploaded image and provide a comprehensive, detailed solution. \n\
\n\
Please structure your response as follows:\n\
\n\
1. **Problem Understanding**: First, clearly identify and explain what the problem is asking for.\n\
\n\
2. **Step-by-Step Solution**: Provide a detailed, step-by-step breakdown of how to solve this problem. Use clear, numbered steps or logical progression. Explain WHY each step is necessary.\n\
\n\
3. **Detailed Explanation**: For each major concept or formula used, provide background explanation. Don't assume the student knows everything - explain the underlying principles.\n\
\n\
4. **Final Answer**: Clearly state the final answer in a separate section.\n\
\n\
5. **Summary**: Provide key takeaways or concepts that the student should remember from this problem.\n\
\n\
Please be thorough and educational. Use as much detail as needed to help a student truly understand the concept, not just get the answer. Include relevant formulas, theorems, or principles that apply."
    )
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Run one solve for an optional identified caller.
///
/// # Errors
///
/// Returns [`SolveError::Validation`] without contacting any provider when
/// the image is missing or empty, [`SolveError::NoCredentials`] when no
/// selectable provider has a key, or a provider error.
pub async fn solve(state: &AppState, user: Option<&UserProfile>, request: SolveRequest) -> Result<SolveOutcome, SolveError> {
    let image = request
        .image
        .filter(|img| !img.bytes.is_empty())
        .ok_or_else(|| SolveError::Validation("No image uploaded.".into()))?;
    let subject = normalize_subject(Some(&request.subject));

    let stored = match user {
        Some(user) => state.store.api_keys(user.id).await.unwrap_or_else(|e| {
            warn!(error = %e, user_id = %user.id, "could not fetch stored API keys");
            CredentialSet::new()
        }),
        None => CredentialSet::new(),
    };
    let effective = merge_credentials(&stored, &request.credentials);
    let (provider, credential) = resolve_provider(&effective)?;

    info!(%provider, %subject, bytes = image.bytes.len(), identified = user.is_some(), "solve: invoking provider");
    let prompt = build_prompt(&subject);
    let raw = state
        .providers
        .invoke(provider, &credential, &image, &prompt)
        .await
        .map_err(|e| match e {
            LlmError::ProviderUnavailable(p) => {
                error!(provider = %p, "solve: provider has no binding");
                SolveError::ProviderUnavailable(p)
            }
            other => {
                error!(error = %other, %provider, "solve: provider call failed");
                SolveError::ProviderCallFailed(other)
            }
        })?;

    let sections = segment(&raw);
    let markup = render(&sections, provider).to_markup();
    info!(%provider, steps = sections.step_count(), has_final_answer = sections.final_answer.is_some(), "solve: rendered");

    if let Some(user) = user {
        history::record(
            state.store.as_ref(),
            user.id,
            request.filename.as_deref(),
            &subject,
            &raw,
            provider,
            state.config.history_timeout,
        )
        .await;
    }

    Ok(SolveOutcome { provider, raw, sections, markup })
}

#[cfg(test)]
#[path = "solve_test.rs"]
mod tests;
