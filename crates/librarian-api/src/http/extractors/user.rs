//! Caller identity extractor.
//!
//! The upstream auth gateway authenticates the caller and forwards the
//! resolved user id in the `X-User-Id` header. Requests without it are
//! refused with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::http::error::AppError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(USER_ID_HEADER).ok_or_else(|| {
            AppError::Unauthorized("Missing user identity. Provide the 'X-User-Id' header.".to_string())
        })?;
        let user = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid X-User-Id header encoding".to_string()))?
            .trim();
        if user.is_empty() {
            return Err(AppError::Unauthorized("Empty X-User-Id header".to_string()));
        }
        Ok(UserId(user.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    use super::*;

    async fn extract(header: Option<&str>) -> Result<UserId, AppError> {
        let mut builder = Request::builder().uri("/api/v1/books");
        if let Some(value) = header {
            builder = builder.header("X-User-Id", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        UserId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_user_id_read_from_header() {
        let user = extract(Some(" reader-42 ")).await.unwrap();
        assert_eq!(user.as_str(), "reader-42");
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_blank_header_is_unauthorized() {
        let err = extract(Some("   ")).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
