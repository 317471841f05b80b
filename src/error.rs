//! Error codes and the JSON error envelope returned by HTTP routes.
//!
//! DESIGN
//! ======
//! Service errors stay typed (`thiserror` enums per service). Each one
//! implements [`ErrorCode`] so routes can translate it into a status code and
//! an `{ "error": ..., "code": ... }` body without string matching.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

/// Grepable error code and HTTP status for structured error responses.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Error response body. Built from any [`ErrorCode`] or from a plain message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    /// Per-field messages, serialized as `errors` when present.
    pub details: Vec<String>,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), details: Vec::new() }
    }

    /// Build from a typed error, using its display text as the message.
    #[must_use]
    pub fn from_code(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status: err.status(), code: err.error_code(), message: err.to_string(), details: Vec::new() }
    }

    /// Build from a typed error but replace the message shown to the caller.
    #[must_use]
    pub fn with_message(err: &(impl ErrorCode + ?Sized), message: impl Into<String>) -> Self {
        Self { status: err.status(), code: err.error_code(), message: message.into(), details: Vec::new() }
    }

    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "error": self.message, "code": self.code });
        if !self.details.is_empty() {
            body["errors"] = serde_json::json!(self.details);
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("not found")]
    struct NotFound;

    impl ErrorCode for NotFound {
        fn error_code(&self) -> &'static str {
            "E_NOT_FOUND"
        }

        fn status(&self) -> StatusCode {
            StatusCode::NOT_FOUND
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    impl ErrorCode for Boom {
        fn error_code(&self) -> &'static str {
            "E_BOOM"
        }
    }

    #[test]
    fn from_code_uses_display_and_status() {
        let err = ApiError::from_code(&NotFound);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "E_NOT_FOUND");
        assert_eq!(err.message, "not found");
    }

    #[test]
    fn default_status_is_internal_error() {
        let err = ApiError::from_code(&Boom);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn with_message_overrides_text_only() {
        let err = ApiError::with_message(&NotFound, "nothing here");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "E_NOT_FOUND");
        assert_eq!(err.message, "nothing here");
    }

    #[test]
    fn with_details_keeps_code() {
        let err = ApiError::from_code(&NotFound).with_details(vec!["a".into(), "b".into()]);
        assert_eq!(err.code, "E_NOT_FOUND");
        assert_eq!(err.details.len(), 2);
    }

    #[test]
    fn into_response_carries_status() {
        let resp = ApiError::new(StatusCode::BAD_REQUEST, "E_X", "bad").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
