//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the JSON + multipart HTTP API under a single Axum router with
//! permissive CORS (browser front ends are served from other origins) and
//! per-request tracing.

pub mod api_keys;
pub mod auth;
pub mod history;
pub mod solve;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// All API routes with shared layers applied.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/solve", post(solve::solve))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::profile))
        .route("/api-keys", get(api_keys::get_keys).post(api_keys::save_keys))
        .route("/history", get(history::list))
        .route("/healthz", get(healthz))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
