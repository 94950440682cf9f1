//! Custom error types for the API service

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use common::guard::AuthRejection;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid or expired credential
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to touch the resource
    #[error("{0}")]
    Forbidden(String),

    /// Malformed input
    #[error("{0}")]
    Validation(String),

    /// Per-author upcoming event cap reached
    #[error("{0}")]
    CapacityExceeded(String),

    /// Duplicate city, venue slug or vote
    #[error("{0}")]
    Conflict(String),

    /// Referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Too many messages in the current window
    #[error("{message}")]
    RateLimited { message: String, retry_after_secs: u64 },

    /// Store failures and other unexpected conditions
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<AuthRejection> for ApiError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection.status {
            401 => ApiError::Unauthorized(rejection.error.to_string()),
            403 => ApiError::Forbidden(rejection.error.to_string()),
            _ => ApiError::Internal(anyhow::anyhow!(rejection.error)),
        }
    }
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) | ApiError::CapacityExceeded(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let retry_after = match &self {
            ApiError::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        };

        let error_message = match self {
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("mine".into()), StatusCode::FORBIDDEN),
            (ApiError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::CapacityExceeded("full".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("dup".into()), StatusCode::CONFLICT),
            (ApiError::not_found("Event"), StatusCode::NOT_FOUND),
            (
                ApiError::Internal(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited {
            message: "slow down".into(),
            retry_after_secs: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn test_guard_rejection_conversion() {
        let err = ApiError::from(AuthRejection {
            status: 401,
            error: "Authentication required",
        });
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Authentication required"));

        let err = ApiError::from(AuthRejection {
            status: 500,
            error: "Internal server error",
        });
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
