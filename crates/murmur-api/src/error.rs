//! Closed error taxonomy for the API surface.
//!
//! Every resolver returns `Result<_, ApiError>`; the `IntoResponse` impl maps
//! each variant to an HTTP status and a JSON error body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Identity required but absent from the request context (401).
    /// Raised before any storage access.
    #[error("Authentication required")]
    Unauthenticated,

    /// Login failure (401). Unknown email and wrong password both map here,
    /// so the response never reveals which check failed.
    #[error("Incorrect credentials")]
    IncorrectCredentials,

    /// Referenced entity does not exist (404)
    #[error("Resource not found")]
    NotFound,

    /// Uniqueness violation on signup (409)
    #[error("Username or email already in use")]
    Conflict,

    /// Invalid input (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage or infrastructure failure (500); details are logged, never
    /// returned to the caller.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", self.to_string())
            }
            ApiError::IncorrectCredentials => (
                StatusCode::UNAUTHORIZED,
                "incorrect_credentials",
                self.to_string(),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            ApiError::Conflict => (StatusCode::CONFLICT, "conflict", self.to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            ApiError::Internal(err) => {
                error!("internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(serde_json::json!({
            "error": kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}
