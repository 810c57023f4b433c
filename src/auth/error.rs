use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Authentication errors that surface as HTTP responses.
///
/// Sign-in flow failures do not use this type: they redirect to the
/// configured auth page with an `error` code instead.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No auth action at this path.
    #[error("Not found")]
    NotFound,

    /// Session token could not be sealed.
    #[error("Session token error: {0}")]
    Token(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
            }
            Self::Token(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<crate::error::Error> for AuthError {
    fn from(e: crate::error::Error) -> Self {
        match e {
            crate::error::Error::Config(msg) => Self::Config(msg),
            other => Self::Token(other.to_string()),
        }
    }
}
