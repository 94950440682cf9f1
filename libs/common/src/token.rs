//! Token service for identity token issuance and verification
//!
//! Tokens are stateless HS256 JWTs carrying the user id and email. A token is
//! valid only while its signature verifies against the service secret and the
//! injected clock reads strictly before its expiry. Nothing is persisted
//! server-side, so a token stops working only when it expires.

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::clock::Clock;

/// Default validity window in days
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared secret used to sign and verify tokens
    pub secret: String,
    /// Token validity window
    pub expiry: Duration,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Signing secret (required)
    /// - `JWT_EXPIRY_DAYS`: Token lifetime in days (default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let expiry_days = std::env::var("JWT_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_EXPIRY_DAYS.to_string())
            .parse()
            .unwrap_or(DEFAULT_EXPIRY_DAYS);

        Ok(TokenConfig {
            secret,
            expiry: Duration::days(expiry_days),
        })
    }
}

/// Errors raised by the token service
#[derive(Error, Debug)]
pub enum TokenError {
    /// Signature mismatch, malformed token or expiry
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token could not be encoded
    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiration, seconds since the epoch
    pub exp: i64,
}

/// Identity recovered from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub email: String,
}

/// Issues and verifies identity tokens
///
/// Callers depend on this trait rather than on [`JwtService`], so a revocation
/// list can later be layered in without touching them.
pub trait TokenService: Send + Sync {
    /// Produce a signed token for the given subject
    fn issue(&self, user_id: Uuid, email: &str) -> Result<String, TokenError>;

    /// Verify signature and expiry, returning the embedded identity
    fn verify(&self, token: &str) -> Result<TokenIdentity, TokenError>;

    /// How long a freshly issued token stays valid
    fn validity(&self) -> Duration;

    /// Verify a token and issue a fresh one for the same subject
    fn renew(&self, token: &str) -> Result<String, TokenError> {
        let identity = self.verify(token)?;
        self.issue(identity.user_id, &identity.email)
    }
}

/// Parse a `Bearer <token>` credential
///
/// Returns `None` when the header is absent or malformed so callers can tell
/// "no credential" apart from "bad credential".
pub fn extract_from_header(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// JWT-backed token service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked against the injected clock, not the system time.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            expiry: config.expiry,
            clock,
        }
    }
}

impl TokenService for JwtService {
    fn validity(&self) -> Duration {
        self.expiry
    }

    fn issue(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        let now = self.clock.now();

        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    fn verify(&self, token: &str) -> Result<TokenIdentity, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                warn!("Rejected token: {}", e);
                TokenError::InvalidToken(e.to_string())
            })?;

        let claims = token_data.claims;
        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::InvalidToken("token expired".to_string()));
        }

        Ok(TokenIdentity {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use serial_test::serial;

    fn service_at(clock: Arc<ManualClock>) -> JwtService {
        let config = TokenConfig {
            secret: "test-secret-with-enough-entropy".to_string(),
            expiry: Duration::days(DEFAULT_EXPIRY_DAYS),
        };
        JwtService::new(config, clock)
    }

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify_returns_identity() {
        let service = service_at(Arc::new(ManualClock::new(start())));
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id, "anna@example.com").unwrap();
        let identity = service.verify(&token).unwrap();

        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "anna@example.com");
    }

    #[test]
    fn test_token_expires_after_window() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(clock.clone());
        let token = service.issue(Uuid::new_v4(), "anna@example.com").unwrap();

        clock.advance(Duration::days(30) - Duration::seconds(1));
        assert!(service.verify(&token).is_ok());

        clock.set(start() + Duration::days(30) + Duration::seconds(1));
        let err = service.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidToken(_)));
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let service = service_at(Arc::new(ManualClock::new(start())));
        let token = service.issue(Uuid::new_v4(), "anna@example.com").unwrap();

        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut bytes = signature.as_bytes().to_vec();
        bytes[0] = if bytes[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{}.{}", head, String::from_utf8(bytes).unwrap());

        let err = service.verify(&tampered).unwrap_err();
        assert!(matches!(err, TokenError::InvalidToken(_)));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let clock = Arc::new(ManualClock::new(start()));
        let other = JwtService::new(
            TokenConfig {
                secret: "another-secret".to_string(),
                expiry: Duration::days(1),
            },
            clock.clone(),
        );
        let token = other.issue(Uuid::new_v4(), "anna@example.com").unwrap();

        assert!(service_at(clock).verify(&token).is_err());
    }

    #[test]
    fn test_renew_keeps_subject() {
        let clock = Arc::new(ManualClock::new(start()));
        let service = service_at(clock.clone());
        let user_id = Uuid::new_v4();
        let token = service.issue(user_id, "anna@example.com").unwrap();

        clock.advance(Duration::days(10));
        let renewed = service.renew(&token).unwrap();

        clock.advance(Duration::days(25));
        assert!(service.verify(&token).is_err());
        assert_eq!(service.verify(&renewed).unwrap().user_id, user_id);
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(extract_from_header(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_from_header(None), None);
        assert_eq!(extract_from_header(Some("Basic abc")), None);
        assert_eq!(extract_from_header(Some("Bearer")), None);
        assert_eq!(extract_from_header(Some("Bearer ")), None);
        assert_eq!(extract_from_header(Some("Bearer a b")), None);
        assert_eq!(extract_from_header(Some("bearer abc")), None);
    }

    #[test]
    #[serial]
    fn test_token_config_from_env() {
        unsafe {
            std::env::set_var("JWT_SECRET", "env-secret");
            std::env::remove_var("JWT_EXPIRY_DAYS");
        }

        let config = TokenConfig::from_env().unwrap();
        assert_eq!(config.secret, "env-secret");
        assert_eq!(config.expiry, Duration::days(30));

        unsafe {
            std::env::set_var("JWT_EXPIRY_DAYS", "7");
        }
        assert_eq!(TokenConfig::from_env().unwrap().expiry, Duration::days(7));

        unsafe {
            std::env::remove_var("JWT_SECRET");
            std::env::remove_var("JWT_EXPIRY_DAYS");
        }
        assert!(TokenConfig::from_env().is_err());
    }
}
