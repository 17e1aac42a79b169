//! JWT token utilities for authentication and authorization.
//!
//! Provides creation and validation of the access/refresh token pair. The
//! two token kinds are signed with independent secrets so that leaking one
//! does not compromise the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::{ServiceError, ServiceResult};

/// JWT claims carried by both token kinds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// Issues and validates the signed access/refresh token pair.
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl TokenIssuer {
    /// Creates a new TokenIssuer from explicit secrets and lifetimes.
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        TokenIssuer {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
            validation,
        }
    }

    /// Creates a TokenIssuer with secrets and lifetimes from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            Duration::hours(config.access_token_ttl_hours),
            Duration::days(config.refresh_token_ttl_days),
        )
    }

    /// Generates a short-lived access token bound to the user.
    pub fn issue_access_token(&self, user_id: &str) -> ServiceResult<String> {
        self.issue(user_id, self.access_ttl, &self.access_encoding)
    }

    /// Generates a long-lived refresh token bound to the user.
    pub fn issue_refresh_token(&self, user_id: &str) -> ServiceResult<String> {
        self.issue(user_id, self.refresh_ttl, &self.refresh_encoding)
    }

    /// Validates an access token and returns its claims.
    pub fn verify_access_token(&self, token: &str) -> ServiceResult<Claims> {
        self.verify(token, &self.access_decoding)
    }

    /// Validates a refresh token and returns its claims.
    pub fn verify_refresh_token(&self, token: &str) -> ServiceResult<Claims> {
        self.verify(token, &self.refresh_decoding)
    }

    fn issue(&self, user_id: &str, ttl: Duration, key: &EncodingKey) -> ServiceResult<String> {
        let now = Utc::now();
        let exp = now + ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {e}")))
    }

    fn verify(&self, token: &str, key: &DecodingKey) -> ServiceResult<Claims> {
        decode::<Claims>(token, key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::ExpiredToken,
                _ => ServiceError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "access-secret",
            "refresh-secret",
            Duration::hours(12),
            Duration::days(7),
        )
    }

    #[test]
    fn access_token_roundtrip() {
        let issuer = issuer();
        let token = issuer.issue_access_token("user-1").expect("issue");
        let claims = issuer.verify_access_token(&token).expect("verify");
        assert_eq!(claims.sub, "user-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let issuer = issuer();
        let token = issuer.issue_refresh_token("user-1").expect("issue");
        let claims = issuer.verify_refresh_token(&token).expect("verify");
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        // Distinct secrets: a refresh token must fail access verification.
        let issuer = issuer();
        let token = issuer.issue_refresh_token("user-1").expect("issue");
        assert!(matches!(
            issuer.verify_access_token(&token),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let issuer = issuer();
        let mut token = issuer.issue_access_token("user-1").expect("issue");
        token.push('x');
        assert!(matches!(
            issuer.verify_access_token(&token),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_distinguished() {
        let expired = TokenIssuer::new(
            "access-secret",
            "refresh-secret",
            Duration::hours(-2),
            Duration::hours(-2),
        );
        let token = expired.issue_refresh_token("user-1").expect("issue");
        assert!(matches!(
            expired.verify_refresh_token(&token),
            Err(ServiceError::ExpiredToken)
        ));
    }
}
