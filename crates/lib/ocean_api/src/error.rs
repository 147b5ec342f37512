//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ocean_core::auth::AuthError;
use ocean_core::store::StoreError;
use thiserror::Error;
use tracing::error;

use crate::envelope::{ApiResponse, FieldError};

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Generic message for every authentication failure.
pub const UNAUTHENTICATED: &str = "Not authorized, token failed";

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// A well-formed request that breaks a domain rule.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// The generic 401 used by the authentication gate.
    pub fn unauthenticated() -> Self {
        AppError::Unauthorized(UNAUTHENTICATED.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(errors) => ApiResponse::failure("Validation failed", Some(errors)),
            AppError::BadRequest(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::Conflict(m)
            | AppError::RateLimited(m) => ApiResponse::failure(m, None),
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                ApiResponse::failure("Internal server error", None)
            }
        };
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::TokenInvalid => AppError::unauthenticated(),
            AuthError::TokenError(msg) | AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Db(e) => AppError::Internal(e.to_string()),
            StoreError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let resp = AppError::Internal("connection refused on 10.0.0.3".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Internal server error");
    }

    #[tokio::test]
    async fn validation_lists_every_field() {
        let resp = AppError::Validation(vec![
            FieldError::new("name", "too short"),
            FieldError::new("email", "invalid"),
        ])
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["errors"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn token_failures_are_generic_401() {
        let err = AppError::from(AuthError::TokenInvalid);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert!(matches!(err, AppError::Unauthorized(m) if m == UNAUTHENTICATED));
    }

    #[test]
    fn store_conflict_maps_to_409() {
        let err = AppError::from(StoreError::Conflict("email".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
