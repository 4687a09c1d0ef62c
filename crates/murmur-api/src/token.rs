//! Stateless token service: issues and verifies signed identity tokens.
//!
//! HS256 with a single process-wide secret, loaded once at startup and passed
//! in explicitly. A changed secret invalidates all outstanding tokens.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use murmur_types::api::{Claims, IdentityClaim};

/// Fixed validity window for issued tokens.
const TOKEN_TTL_HOURS: i64 = 2;

/// Verification failures. Both degrade to an anonymous context at the
/// extractor boundary; the split exists for logging and tests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign a token carrying the claim, valid for the fixed window.
    pub fn issue(&self, claim: &IdentityClaim) -> Result<String> {
        self.issue_with_ttl(claim, Duration::hours(TOKEN_TTL_HOURS))
    }

    fn issue_with_ttl(&self, claim: &IdentityClaim, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            data: claim.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Check signature and expiry, returning the embedded claim on success.
    pub fn verify(&self, token: &str) -> Result<IdentityClaim, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.data)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claim() -> IdentityClaim {
        IdentityClaim {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
        }
    }

    #[test]
    fn verify_round_trips_issued_claim() {
        let svc = TokenService::new("test-secret");
        let claim = claim();
        let token = svc.issue(&claim).unwrap();
        assert_eq!(svc.verify(&token).unwrap(), claim);
    }

    #[test]
    fn expired_token_is_distinguished_from_tampered() {
        let svc = TokenService::new("test-secret");
        // Past the window and the default leeway
        let token = svc
            .issue_with_ttl(&claim(), Duration::hours(-3))
            .unwrap();
        assert_eq!(svc.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let svc = TokenService::new("test-secret");
        let other = TokenService::new("another-secret");
        let token = other.issue(&claim()).unwrap();
        assert_eq!(svc.verify(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn garbage_is_invalid() {
        let svc = TokenService::new("test-secret");
        assert_eq!(svc.verify("not-a-token").unwrap_err(), TokenError::Invalid);
    }
}
