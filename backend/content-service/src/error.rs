/// Error types for Content Service
///
/// Every failure is folded into one of the API's error classes before it
/// leaves a handler. Storage and unexpected failures are logged here and
/// reach the client only as a generic message.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Result type for content-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// No or invalid caller identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request DTO failed declarative validation
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Uniqueness violation (duplicate purchase, reused transaction hash)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message safe to show to API clients.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidInput(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Validation(errors) => errors.to_string(),
            AppError::Database(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status).json(json!({
            "status": "error",
            "message": self.public_message(),
        }))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Postgres SQLSTATE for check constraint violations
const CHECK_VIOLATION: &str = "23514";

/// Map constraint failures on content writes to client errors.
///
/// A check violation means the row the caller asked for is invalid (for
/// example a paid tier without a price), which is their input, not our fault.
pub(crate) fn map_content_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(CHECK_VIOLATION) {
            return AppError::InvalidInput(format!(
                "content violates constraint {}",
                db_err.constraint().unwrap_or("unknown")
            ));
        }
    }
    AppError::Database(err)
}
