//! JWT issuance and verification.
//!
//! Tokens are signed with HS256 and carry the issuer/audience pair plus an
//! `auth_time` claim recording when the session started. Verification checks
//! signature, expiry, issuer and audience; session age is checked separately
//! so the limit can be enforced per request.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;

/// Token-related errors.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Token is expired.
    #[error("token expired")]
    Expired,

    /// Token failed signature, issuer, or audience checks.
    #[error("invalid token")]
    Invalid,

    /// The session exceeded its maximum age.
    #[error("session expired")]
    SessionExpired,

    /// Token could not be created.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity id.
    pub sub: String,
    /// Email at issuance time.
    pub email: String,
    /// Role at issuance time.
    pub role: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// When the session started (unix seconds).
    pub auth_time: i64,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

impl Claims {
    /// The subject parsed as an identity id.
    pub fn identity_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    /// Whether the session that produced this token is older than `max_age`.
    pub fn session_age_exceeded(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now.timestamp() - self.auth_time > max_age.num_seconds()
    }
}

/// Issues and verifies access tokens for a fixed issuer/audience pair.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    session_max_age: Duration,
}

impl TokenIssuer {
    /// Create an issuer from configuration.
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            session_max_age: Duration::seconds(config.session_max_age_secs as i64),
        }
    }

    /// Issue a token for an identity. The session starts at `now`.
    pub fn issue(
        &self,
        identity_id: i64,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: identity_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            auth_time: now.timestamp(),
            iat: now.timestamp(),
            exp: (now + self.session_max_age).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Maximum session age tokens are issued for.
    pub fn session_max_age(&self) -> Duration {
        self.session_max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-for-tokens".to_string(),
            issuer: "mugshop-admin".to_string(),
            audience: "mugshop-admin-panel".to_string(),
            session_max_age_secs: 14400,
        }
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let issuer = TokenIssuer::new(&config());
        let now = Utc::now();

        let token = issuer.issue(42, "admin@mugshop.com", "admin", now).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.identity_id(), Some(42));
        assert_eq!(claims.email, "admin@mugshop.com");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, "mugshop-admin");
        assert_eq!(claims.aud, "mugshop-admin-panel");
        assert_eq!(claims.auth_time, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 14400);
    }

    #[test]
    fn test_tokens_carry_unique_jti() {
        let issuer = TokenIssuer::new(&config());
        let now = Utc::now();

        let a = issuer.issue(1, "a@mugshop.com", "staff", now).unwrap();
        let b = issuer.issue(1, "a@mugshop.com", "staff", now).unwrap();

        let ca = issuer.verify(&a).unwrap();
        let cb = issuer.verify(&b).unwrap();
        assert_ne!(ca.jti, cb.jti);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new(&config());
        let issued = Utc::now() - Duration::hours(5);

        let token = issuer.issue(1, "a@mugshop.com", "staff", issued).unwrap();
        let err = issuer.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = TokenIssuer::new(&config());
        let token = issuer
            .issue(1, "a@mugshop.com", "staff", Utc::now())
            .unwrap();

        // Flip a character in the payload segment
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let mut payload: Vec<u8> = parts[1].clone().into_bytes();
        payload[0] = if payload[0] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload).unwrap();
        let tampered = parts.join(".");

        let err = issuer.verify(&tampered).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenIssuer::new(&config());
        let other = TokenIssuer::new(&JwtConfig {
            secret: "a-different-secret".to_string(),
            ..config()
        });

        let token = other
            .issue(1, "a@mugshop.com", "staff", Utc::now())
            .unwrap();
        assert!(matches!(
            issuer.verify(&token).unwrap_err(),
            TokenError::Invalid
        ));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let issuer = TokenIssuer::new(&config());
        let other = TokenIssuer::new(&JwtConfig {
            issuer: "someone-else".to_string(),
            ..config()
        });

        let token = other
            .issue(1, "a@mugshop.com", "staff", Utc::now())
            .unwrap();
        assert!(matches!(
            issuer.verify(&token).unwrap_err(),
            TokenError::Invalid
        ));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let issuer = TokenIssuer::new(&config());
        let other = TokenIssuer::new(&JwtConfig {
            audience: "some-other-app".to_string(),
            ..config()
        });

        let token = other
            .issue(1, "a@mugshop.com", "staff", Utc::now())
            .unwrap();
        assert!(matches!(
            issuer.verify(&token).unwrap_err(),
            TokenError::Invalid
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = TokenIssuer::new(&config());
        assert!(matches!(
            issuer.verify("not.a.token").unwrap_err(),
            TokenError::Invalid
        ));
        assert!(matches!(
            issuer.verify("").unwrap_err(),
            TokenError::Invalid
        ));
    }

    #[test]
    fn test_session_age_exceeded() {
        let issuer = TokenIssuer::new(&config());
        let start = Utc::now();
        let token = issuer.issue(1, "a@mugshop.com", "staff", start).unwrap();
        let claims = issuer.verify(&token).unwrap();

        let max = Duration::seconds(14400);
        assert!(!claims.session_age_exceeded(max, start + Duration::seconds(14400)));
        assert!(claims.session_age_exceeded(max, start + Duration::seconds(14401)));
    }
}
