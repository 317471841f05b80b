//! Stored API key routes.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::llm::{CredentialSet, ProviderName};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SaveKeysBody {
    #[serde(rename = "apiKeys", default)]
    api_keys: BTreeMap<String, serde_json::Value>,
}

/// Build the set to upsert. Blank and non-string values are skipped;
/// unknown provider names are an error.
pub(crate) fn keys_from_body(raw: &BTreeMap<String, serde_json::Value>) -> Result<CredentialSet, ApiError> {
    let mut keys = CredentialSet::new();
    for (name, value) in raw {
        let provider = ProviderName::parse(name).ok_or_else(|| {
            ApiError::new(StatusCode::BAD_REQUEST, "E_VALIDATION", format!("Unknown provider: {name}"))
        })?;
        if let Some(key) = value.as_str() {
            keys.insert(provider, key);
        }
    }
    Ok(keys)
}

/// `GET /api-keys`: stored keys for the current user.
pub async fn get_keys(State(state): State<AppState>, auth: AuthUser) -> Result<Json<serde_json::Value>, ApiError> {
    let keys = state.store.api_keys(auth.user.id).await.map_err(|e| {
        tracing::error!(error = %e, user_id = %auth.user.id, "fetch api keys failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "E_STORE", "Failed to fetch API keys")
    })?;
    Ok(Json(serde_json::json!({ "apiKeys": keys })))
}

/// `POST /api-keys`: upsert non-blank keys, last write wins.
pub async fn save_keys(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SaveKeysBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let keys = keys_from_body(&body.api_keys)?;
    state
        .store
        .upsert_api_keys(auth.user.id, &keys)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %auth.user.id, "save api keys failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "E_STORE", "Failed to save API keys")
        })?;
    tracing::info!(user_id = %auth.user.id, count = keys.len(), "api keys saved");
    Ok(Json(serde_json::json!({ "message": "API keys saved successfully" })))
}
