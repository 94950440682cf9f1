//! Custom error types for the account service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::guard::AuthRejection;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the account service
#[derive(Error, Debug)]
pub enum AccountError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Bad credentials or missing/invalid token
    #[error("{0}")]
    Unauthorized(String),

    /// Email already registered
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected: store connectivity, hashing, signing
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AuthRejection> for AccountError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection.status {
            401 => AccountError::Unauthorized(rejection.error.to_string()),
            _ => AccountError::Internal(anyhow::anyhow!(rejection.error)),
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AccountError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AccountError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AccountError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AccountError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for account service results
pub type AccountResult<T> = Result<T, AccountError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AccountError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AccountError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (AccountError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                AccountError::Internal(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_guard_rejection_conversion() {
        let err = AccountError::from(AuthRejection {
            status: 401,
            error: "Authentication required",
        });
        assert!(matches!(err, AccountError::Unauthorized(ref m) if m == "Authentication required"));

        let err = AccountError::from(AuthRejection {
            status: 500,
            error: "Internal server error",
        });
        assert!(matches!(err, AccountError::Internal(_)));
    }
}
