//! Auth routes and bearer extractors.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::error::{ApiError, ErrorCode};
use crate::services::store::UserProfile;
use crate::services::{account, session};
use crate::state::AppState;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,
    #[error("Session expired or invalid")]
    InvalidSession,
    #[error("Authentication failed")]
    Lookup,
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "E_AUTH_MISSING_TOKEN",
            Self::InvalidSession => "E_AUTH_INVALID_SESSION",
            Self::Lookup => "E_AUTH_FAILED",
        }
    }

    fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

// =============================================================================
// AUTH EXTRACTORS
// =============================================================================

/// Authenticated user extracted from `Authorization: Bearer <token>`.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: UserProfile,
    pub token: String,
}

async fn resolve_bearer(parts: &Parts, state: &AppState) -> Result<AuthUser, AuthError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(session::bearer_token)
        .ok_or(AuthError::MissingToken)?;

    let user = session::validate_session(state.store.as_ref(), token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "session lookup failed");
            AuthError::Lookup
        })?
        .ok_or(AuthError::InvalidSession)?;

    Ok(AuthUser { user, token: token.to_owned() })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        resolve_bearer(parts, &app_state)
            .await
            .map_err(|e| ApiError::from_code(&e))
    }
}

/// Identity when a valid bearer token is present, `None` otherwise. Never
/// rejects.
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        Ok(Self(resolve_bearer(parts, &app_state).await.ok()))
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn account_error(err: &account::AccountError) -> ApiError {
    match err {
        account::AccountError::Validation(details) => {
            ApiError::with_message(err, "Validation failed").with_details(details.clone())
        }
        account::AccountError::Store(e) => {
            tracing::error!(error = %e, "account store error");
            ApiError::from_code(err)
        }
        _ => ApiError::from_code(err),
    }
}

#[derive(Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// `POST /auth/register`: create an account and return a session token.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = account::register(
        state.store.as_ref(),
        &body.name,
        &body.email,
        &body.password,
        state.config.session_ttl_days,
    )
    .await
    .map_err(|e| account_error(&e))?;

    let body = serde_json::json!({
        "message": "User created successfully",
        "user": auth.user,
        "token": auth.token,
    });
    Ok((StatusCode::CREATED, Json(body)))
}

#[derive(Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// `POST /auth/login`: verify credentials and return a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let auth = account::login(state.store.as_ref(), &body.email, &body.password, state.config.session_ttl_days)
        .await
        .map_err(|e| account_error(&e))?;

    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "user": auth.user,
        "token": auth.token,
    })))
}

/// `POST /auth/logout`: delete the presented session.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<Json<serde_json::Value>, ApiError> {
    session::delete_session(state.store.as_ref(), &auth.token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "logout failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "E_STORE", "Logout failed")
        })?;
    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

/// `GET /auth/profile`: return the current user.
pub async fn profile(auth: AuthUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "user": auth.user }))
}
