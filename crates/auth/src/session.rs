//! Session token issuing and verification.
//!
//! Tokens are HS256 JWTs signed with the shared password itself, carrying a
//! single `iat` claim and no expiry: a session lasts until explicit logout
//! clears the cookie.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing, malformed, or wrongly-signed session token.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Token encoding failed. Should not occur with HS256 keys.
    #[error("failed to issue session token")]
    TokenIssue,
}

/// Compare a supplied password against the configured shared secret.
pub fn password_matches(supplied: &str, expected: &str) -> bool {
    supplied == expected
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    iat: i64,
}

/// Issues and verifies session tokens for one shared secret.
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionSigner {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Sessions have no expiry; only the signature matters.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a session token for a successful login.
    pub fn issue(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = SessionClaims {
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenIssue)
    }

    /// Verify a presented session token.
    pub fn verify(&self, token: &str) -> Result<(), AuthError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|_| ())
            .map_err(|_| AuthError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let signer = SessionSigner::new(b"hunter2");
        let token = signer.issue(Utc::now()).unwrap();
        signer.verify(&token).unwrap();
    }

    #[test]
    fn tokens_signed_with_another_password_fail() {
        let signer = SessionSigner::new(b"hunter2");
        let other = SessionSigner::new(b"letmein");
        let token = other.issue(Utc::now()).unwrap();

        let err = signer.verify(&token).unwrap_err();
        assert_eq!(err, AuthError::NotAuthenticated);
        assert_eq!(err.to_string(), "Not authenticated");
    }

    #[test]
    fn garbage_tokens_fail() {
        let signer = SessionSigner::new(b"hunter2");
        assert!(signer.verify("not-a-token").is_err());
        assert!(signer.verify("").is_err());
    }

    #[test]
    fn tokens_do_not_expire() {
        // iat far in the past still verifies: sessions end at logout only.
        let signer = SessionSigner::new(b"hunter2");
        let old = Utc::now() - chrono::Duration::days(3650);
        let token = signer.issue(old).unwrap();
        signer.verify(&token).unwrap();
    }

    #[test]
    fn password_comparison() {
        assert!(password_matches("1234", "1234"));
        assert!(!password_matches("123", "1234"));
    }
}
