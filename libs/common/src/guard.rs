//! Authentication guard
//!
//! Resolves an `Authorization` header to a user record: the bearer token is
//! extracted, verified by the [`TokenService`] and its subject looked up
//! through a [`UserLookup`]. A successful authentication performs exactly one
//! store read and no writes.

use thiserror::Error;
use tracing::{error, warn};

use crate::{
    token::{TokenService, extract_from_header},
    users::{AuthUser, UserLookup},
};

/// Message shared by every bad-credential case so callers cannot tell them apart
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again";

/// Message for requests that carry no credential
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required";

/// Why a request could not be authenticated
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No bearer credential supplied")]
    MissingCredential,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token subject no longer exists")]
    UserNotFound,

    #[error("User lookup failed: {0}")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    /// HTTP status for this failure
    pub fn status(&self) -> u16 {
        match self {
            AuthError::MissingCredential | AuthError::InvalidToken | AuthError::UserNotFound => {
                401
            }
            AuthError::Internal(_) => 500,
        }
    }

    /// User-facing message for this failure
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => AUTH_REQUIRED_MESSAGE,
            AuthError::InvalidToken | AuthError::UserNotFound => SESSION_EXPIRED_MESSAGE,
            AuthError::Internal(_) => "Internal server error",
        }
    }
}

/// Rejection produced by [`require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRejection {
    pub status: u16,
    pub error: &'static str,
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        AuthRejection {
            status: err.status(),
            error: err.public_message(),
        }
    }
}

/// Authenticate a request from its `Authorization` header value
pub async fn authenticate(
    header: Option<&str>,
    tokens: &dyn TokenService,
    users: &dyn UserLookup,
) -> Result<AuthUser, AuthError> {
    let token = extract_from_header(header).ok_or(AuthError::MissingCredential)?;

    let identity = tokens.verify(token).map_err(|_| AuthError::InvalidToken)?;

    users
        .find_public_by_id(identity.user_id)
        .await
        .map_err(AuthError::Internal)?
        .ok_or_else(|| {
            warn!("Valid token for unknown user {}", identity.user_id);
            AuthError::UserNotFound
        })
}

/// Authenticate and map failures to a status and message for write routes
pub async fn require_auth(
    header: Option<&str>,
    tokens: &dyn TokenService,
    users: &dyn UserLookup,
) -> Result<AuthUser, AuthRejection> {
    authenticate(header, tokens, users).await.map_err(|e| {
        if let AuthError::Internal(source) = &e {
            error!("Authentication failed on user lookup: {:#}", source);
        }
        AuthRejection::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        token::{JwtService, TokenConfig},
    };
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use uuid::Uuid;

    #[derive(Default)]
    struct InMemoryUsers {
        users: Vec<AuthUser>,
        reads: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl UserLookup for InMemoryUsers {
        async fn find_public_by_id(&self, id: Uuid) -> anyhow::Result<Option<AuthUser>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection reset");
            }
            Ok(self.users.iter().find(|u| u.id == id).cloned())
        }
    }

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "ivan@example.com".to_string(),
            name: "Ivan".to_string(),
            avatar: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn tokens() -> JwtService {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        ));
        JwtService::new(
            TokenConfig {
                secret: "guard-secret".to_string(),
                expiry: Duration::days(30),
            },
            clock,
        )
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user_with_one_read() {
        let known = user();
        let users = InMemoryUsers {
            users: vec![known.clone()],
            ..Default::default()
        };
        let tokens = tokens();
        let header = format!("Bearer {}", tokens.issue(known.id, &known.email).unwrap());

        let resolved = authenticate(Some(header.as_str()), &tokens, &users).await.unwrap();

        assert_eq!(resolved, known);
        assert_eq!(users.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_header_is_401_without_store_read() {
        let users = InMemoryUsers::default();

        let rejection = require_auth(None, &tokens(), &users).await.unwrap_err();

        assert_eq!(rejection.status, 401);
        assert_eq!(rejection.error, AUTH_REQUIRED_MESSAGE);
        assert_eq!(users.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_scheme_counts_as_missing() {
        let err = authenticate(Some("Token abc"), &tokens(), &InMemoryUsers::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let users = InMemoryUsers::default();

        let err = authenticate(Some("Bearer not.a.jwt"), &tokens(), &users)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        let rejection = require_auth(Some("Bearer not.a.jwt"), &tokens(), &users)
            .await
            .unwrap_err();
        assert_eq!(rejection.status, 401);
        assert_eq!(users.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_shares_invalid_token_message() {
        let tokens = tokens();
        let header = format!(
            "Bearer {}",
            tokens.issue(Uuid::new_v4(), "ghost@example.com").unwrap()
        );
        let users = InMemoryUsers::default();

        let err = authenticate(Some(header.as_str()), &tokens, &users).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        let rejection = require_auth(Some(header.as_str()), &tokens, &users).await.unwrap_err();
        assert_eq!(rejection.status, 401);
        assert_eq!(rejection.error, SESSION_EXPIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_500() {
        let known = user();
        let tokens = tokens();
        let header = format!("Bearer {}", tokens.issue(known.id, &known.email).unwrap());
        let users = InMemoryUsers {
            fail: true,
            ..Default::default()
        };

        let rejection = require_auth(Some(header.as_str()), &tokens, &users).await.unwrap_err();
        assert_eq!(rejection.status, 500);
    }
}
