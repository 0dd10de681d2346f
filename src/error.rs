//! Error types for the Copla core
//!
//! All errors in the crate are converted to `AppError`. The HTTP layer
//! that embeds this crate gets status codes through the `IntoResponse` impl.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Account, profile or following row absent (404)
    #[error("Resource not found")]
    NotFound,

    /// Ownership violation (403)
    ///
    /// Raised by the caller layer only; operations in this crate accept a
    /// pre-authorized account reference.
    #[error("Access denied")]
    Forbidden,

    /// Invalid or missing input (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate creation where uniqueness is required (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session payload could not be encrypted (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Stored session payload could not be decrypted (422)
    ///
    /// The account has to be re-linked to store a fresh payload.
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short machine-readable error kind, used for metrics and response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Forbidden => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::Conflict(_) => "conflict",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Encryption(_) => "encryption",
            AppError::Decryption(_) => "relink_required",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Internal details (database, encryption) are not echoed to clients.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Decryption(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Failed to retrieve sync credentials. Please re-link your Bluesky account."
                    .to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Encryption(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Encryption error".to_string(),
            ),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[self.kind()]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_parts(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn typed_errors_map_to_client_statuses() {
        let (status, body) = response_parts(AppError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let (status, body) =
            response_parts(AppError::Validation("handle is required".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "handle is required");

        let (status, _) = response_parts(AppError::Conflict("duplicate".to_string())).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn decryption_failure_asks_for_relink_without_details() {
        let (status, body) =
            response_parts(AppError::Decryption("aead::Error".to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "relink_required");
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("re-link"));
        assert!(!message.contains("aead"));
    }

    #[tokio::test]
    async fn internal_errors_are_not_echoed() {
        let (status, body) =
            response_parts(AppError::Encryption("key material xyz".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("xyz"));
    }
}
