//! `POST /solve`: multipart upload to the solve pipeline.

use axum::extract::{Multipart, State};
use axum::response::Json;
use serde::Serialize;

use super::auth::MaybeAuthUser;
use crate::error::ApiError;
use crate::llm::{CredentialSet, ImageInput, ProviderName};
use crate::services::segment::SegmentedSolution;
use crate::services::solve::{self, SolveError, SolveRequest};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SolveResponse {
    /// Rendered HTML fragment.
    pub solution: String,
    pub provider: ProviderName,
    pub sections: SegmentedSolution,
}

/// Invalid `apiKeys` JSON is logged and treated as no keys supplied.
pub(crate) fn parse_api_keys(raw: &str) -> CredentialSet {
    if raw.trim().is_empty() {
        return CredentialSet::new();
    }
    CredentialSet::from_json_str(raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "invalid apiKeys format; ignoring");
        CredentialSet::new()
    })
}

fn bad_multipart(e: impl std::fmt::Display) -> ApiError {
    ApiError::from_code(&SolveError::Validation(format!("Malformed upload: {e}")))
}

async fn read_request(mut multipart: Multipart) -> Result<SolveRequest, ApiError> {
    let mut request = SolveRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().map(str::to_owned);
                let media_type =
                    solve::normalize_media_type(field.content_type()).map_err(|e| ApiError::from_code(&e))?;
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                request.filename = filename;
                request.image = Some(ImageInput::new(bytes.to_vec(), media_type));
            }
            "subject" => request.subject = field.text().await.map_err(bad_multipart)?,
            "apiKeys" => request.credentials = parse_api_keys(&field.text().await.map_err(bad_multipart)?),
            _ => {}
        }
    }
    Ok(request)
}

pub async fn solve(
    State(state): State<AppState>,
    MaybeAuthUser(auth): MaybeAuthUser,
    multipart: Multipart,
) -> Result<Json<SolveResponse>, ApiError> {
    let request = read_request(multipart).await?;
    let user = auth.as_ref().map(|a| &a.user);

    let outcome = solve::solve(&state, user, request)
        .await
        .map_err(|e| ApiError::from_code(&e))?;

    Ok(Json(SolveResponse { solution: outcome.markup, provider: outcome.provider, sections: outcome.sections }))
}
