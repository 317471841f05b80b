//! Doubt history listing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::services::history;
use crate::state::AppState;

/// `GET /history`: the caller's most recent doubts, newest first.
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> Result<Json<serde_json::Value>, ApiError> {
    let doubts = history::list(state.store.as_ref(), auth.user.id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %auth.user.id, "history listing failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "E_STORE", "Failed to fetch history")
        })?;
    Ok(Json(serde_json::json!({ "doubts": doubts })))
}
