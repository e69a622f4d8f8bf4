//! Error types for snotes-server
//!
//! Every handler returns [`ApiResult`]; failures become an HTTP status plus a
//! JSON body `{"error": {"code": ..., "message": ...}}`. Nothing is retried
//! server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body failed schema validation (400); the store was not touched
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No valid session (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not a member or owner (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource or invite code absent (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate membership (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Store failure (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<snotes_common::Error> for ApiError {
    fn from(err: snotes_common::Error) -> Self {
        use snotes_common::Error as Common;
        match err {
            Common::InvalidInput(msg) => ApiError::InvalidInput(msg),
            Common::NotFound(msg) => ApiError::NotFound(msg),
            Common::Database(e) => ApiError::Database(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidInput("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_common_errors_keep_their_meaning() {
        let err: ApiError = snotes_common::Error::InvalidInput("bad".into()).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err: ApiError = snotes_common::Error::NotFound("gone".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = snotes_common::Error::Config("oops".into()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
