use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl AppError {
    /// Classify a database error, mapping unique-key violations to `Conflict`.
    pub fn from_db_with_conflict(err: sqlx::Error, conflict_message: impl Into<String>) -> Self {
        match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(conflict_message.into())
            }
            _ => AppError::Database(err),
        }
    }

    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(e) if is_storage_unreachable(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_unavailable")
            }
            AppError::Database(e)
                if e.as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation()) =>
            {
                (StatusCode::CONFLICT, "conflict")
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::StorageUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_unavailable")
            }
        }
    }
}

fn is_storage_unreachable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_)
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                match code {
                    "storage_unavailable" => "Storage is unavailable".to_string(),
                    "conflict" => "Resource already exists".to_string(),
                    _ => "Database error occurred".to_string(),
                }
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::StorageUnavailable(ref msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                "Storage is unavailable".to_string()
            }
            AppError::NotFound(msg)
            | AppError::InvalidInput(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::PayloadTooLarge(msg) => msg,
        };

        let body = Json(ApiResponse::<()>::error(message, code));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST, "invalid_input"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "unauthorized"),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found"),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "conflict"),
            (
                AppError::StorageUnavailable("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_unavailable",
            ),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            (
                AppError::PayloadTooLarge("x".into()),
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[test]
    fn test_pool_timeout_is_storage_unavailable() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_and_code().1, "storage_unavailable");
    }

    #[test]
    fn test_non_unique_database_error_is_not_conflict() {
        let err = AppError::from_db_with_conflict(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_error_body_carries_code() {
        let response = AppError::NotFound("Unit X not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Unit X not found");
        assert_eq!(body["code"], "not_found");
    }
}
