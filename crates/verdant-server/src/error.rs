use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::db::DbError;

/// Request-level error taxonomy.
///
/// Validation and bad-request messages are surfaced verbatim; authentication
/// rejections carry one generic message regardless of cause; store faults
/// and internal errors are logged and replaced by a generic message so no
/// internal detail leaks.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// The message is the caller-safe generic wording; the cause is logged
    /// at the rejection site.
    #[error("Access denied: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            ServerError::Validation { message, .. } => {
                (StatusCode::BAD_REQUEST, "Validation Error", message.clone())
            }
            ServerError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Access denied", msg.clone()),
            ServerError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Access denied", msg.clone()),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", msg.clone()),
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", msg.clone()),
            ServerError::Db(e) => {
                tracing::error!(error = %e, "store fault surfaced as server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "Unable to process the request. Please try again.".to_string(),
                )
            }
            ServerError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "Unable to process the request. Please try again.".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": error,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_surfaced() {
        let err = ServerError::validation("pincode", "PIN code must be 6 digits");
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_detail_is_hidden() {
        let err = ServerError::Internal("connection pool exploded at line 42".into());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
