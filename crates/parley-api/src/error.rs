//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use parley_dialogue::EngineError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 409 Conflict - state conflict (e.g., feedback already recorded).
    Conflict(String),
    /// 422 Unprocessable Entity - message failed validation.
    UnprocessableEntity(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(e) => ApiError::UnprocessableEntity(e.to_string()),
            EngineError::SessionNotFound(id) => {
                ApiError::NotFound(format!("session not found: {}", id))
            }
            EngineError::MessageNotFound(id) => {
                ApiError::NotFound(format!("message not found: {}", id))
            }
            EngineError::FeedbackConflict(id) => {
                ApiError::Conflict(format!("feedback already recorded: {}", id))
            }
            EngineError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_dialogue::error::ValidationError;

    #[test]
    fn test_validation_maps_to_unprocessable_entity() {
        let err: ApiError = EngineError::Validation(ValidationError::Empty).into();
        assert!(matches!(err, ApiError::UnprocessableEntity(_)));
    }

    #[test]
    fn test_not_found_mappings() {
        let err: ApiError = EngineError::SessionNotFound("session_x".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = EngineError::MessageNotFound("msg_x".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_conflict_and_storage_mappings() {
        let err: ApiError = EngineError::FeedbackConflict("msg_x".to_string()).into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = EngineError::Storage("locked".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
