//! Signed identity tokens.
//!
//! Tokens are HS256 JWTs carrying `{id, email, role, iat, exp}`. Verification
//! checks the signature and expiry with zero leeway; any failure rejects the
//! whole token.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use store_rating_core::{Email, Role, UserId};

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Token errors.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    /// Expiry does not fit in a timestamp.
    #[error("token lifetime out of range")]
    Lifetime,

    /// Bad signature, malformed token or expired.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service for `secret` issuing tokens valid for `ttl`.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl,
        }
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Lifetime` if the expiry overflows, or
    /// `TokenError::Sign` if encoding fails.
    pub fn issue(&self, id: UserId, email: &Email, role: Role) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::Lifetime)?;
        let claims = Claims {
            id,
            email: email.clone(),
            role,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` on a bad signature, malformed token or
    /// expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    fn service() -> TokenService {
        TokenService::new(&SecretString::from(SECRET), Duration::hours(24))
    }

    fn email() -> Email {
        Email::parse("owner@example.com").unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let token = tokens.issue(UserId::new(5), &email(), Role::Owner).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.id, UserId::new(5));
        assert_eq!(claims.email, email());
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service()
            .issue(UserId::new(1), &email(), Role::Admin)
            .unwrap();
        let other = TokenService::new(
            &SecretString::from("zZ9!yY8@xX7#wW6$vV5%uU4^tT3&sS2"),
            Duration::hours(24),
        );

        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let expired = TokenService::new(&SecretString::from(SECRET), Duration::seconds(-5));
        let token = expired
            .issue(UserId::new(1), &email(), Role::User)
            .unwrap();

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let tokens = service();
        let token = tokens.issue(UserId::new(1), &email(), Role::User).unwrap();

        // Swap the payload for one claiming the admin role
        let forged_claims = Claims {
            id: UserId::new(1),
            email: email(),
            role: Role::Admin,
            iat: 0,
            exp: i64::MAX / 2,
        };
        let forged_payload = encode(
            &Header::new(Algorithm::HS256),
            &forged_claims,
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        parts[1] = forged_parts[1];

        assert!(tokens.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_overflowing_lifetime_is_an_error() {
        let tokens = TokenService::new(
            &SecretString::from(SECRET),
            Duration::hours(3_000_000_000),
        );
        let result = tokens.issue(UserId::new(1), &email(), Role::User);

        assert!(matches!(result, Err(TokenError::Lifetime)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(service().verify("not-a-token").is_err());
        assert!(service().verify("").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", service());
        assert!(!debug.contains(SECRET));
    }
}
