//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use librarian_types::error::{ChatError, GuardError, RepositoryError};
use librarian_types::llm::LlmError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from a chat turn.
    Chat(ChatError),
    /// Errors reading the catalog or conversation history.
    Repository(RepositoryError),
    /// Missing or malformed user identity.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    /// Status, machine-readable code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(ChatError::Rejected(GuardError::Empty)) => (
                StatusCode::BAD_REQUEST,
                "EMPTY_MESSAGE",
                "Message must not be empty".to_string(),
            ),
            AppError::Chat(ChatError::Rejected(e)) => {
                (StatusCode::BAD_REQUEST, "MESSAGE_REJECTED", e.to_string())
            }
            AppError::Chat(ChatError::Generation(LlmError::AuthenticationFailed)) => (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_AUTH_FAILED",
                "Generation provider rejected the configured credentials".to_string(),
            ),
            AppError::Chat(ChatError::Generation(e)) => {
                (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", e.to_string())
            }
            AppError::Chat(ChatError::Storage(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e.to_string())
            }
            AppError::Chat(ChatError::Index(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INDEX_ERROR", e.to_string())
            }
            AppError::Repository(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR", e.to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, error = %message, "request failed");
        } else {
            tracing::debug!(code, error = %message, "request refused");
        }

        let body = ApiResponse::error(code, &message, String::new(), 0);
        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"errors":[{"code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}]}"#.to_string()
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            json,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_rejection_is_bad_request() {
        let err = AppError::from(ChatError::Rejected(GuardError::Blocked));
        assert_eq!(err.parts().0, StatusCode::BAD_REQUEST);
        assert_eq!(err.parts().1, "MESSAGE_REJECTED");
    }

    #[test]
    fn test_generation_failure_is_bad_gateway() {
        let err = AppError::from(ChatError::Generation(LlmError::Timeout(60_000)));
        assert_eq!(err.parts().0, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_storage_and_index_failures_are_internal() {
        let storage = AppError::from(ChatError::Storage(RepositoryError::Connection));
        let index = AppError::from(ChatError::Index(RepositoryError::Query("boom".into())));
        assert_eq!(storage.parts().0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(index.parts().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_user_is_unauthorized() {
        let err = AppError::Unauthorized("missing X-User-Id".into());
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bad_filter_is_bad_request() {
        let err = AppError::Validation("unknown filter key: author".into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
