pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

pub use password::{hash_password, verify_missing, verify_password};

/// Claims carried by every staff bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Staff id
    pub sub: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

/// Staff identity a token is issued for
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub staff_id: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
}

impl Claims {
    pub fn new(subject: TokenSubject, security: &SecurityConfig) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(security.jwt_expiry_hours as i64)).timestamp();

        Self {
            sub: subject.staff_id,
            name: subject.name,
            email: subject.email,
            role_id: subject.role_id,
            iss: security.jwt_issuer.clone(),
            iat: now.timestamp(),
            exp,
            jti: Uuid::new_v4(),
        }
    }

    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            staff_id: self.sub,
            name: self.name.clone(),
            email: self.email.clone(),
            role_id: self.role_id,
        }
    }

    /// Seconds until expiry, never negative
    pub fn expires_in(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    Encode(String),

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Sign claims for `subject` with HS256
pub fn issue_token(subject: TokenSubject, security: &SecurityConfig) -> Result<(String, Claims), JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    let claims = Claims::new(subject, security);
    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    let token = encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
        .map_err(|e| JwtError::Encode(e.to_string()))?;

    Ok((token, claims))
}

/// Verify signature, expiry and issuer, returning the claims
pub fn verify_token(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[security.jwt_issuer.as_str()]);
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn security() -> SecurityConfig {
        let mut config = AppConfig::development();
        config.security.jwt_secret = "test-secret".to_string();
        config.security
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            staff_id: 7,
            name: "Amina".to_string(),
            email: "amina@agency.test".to_string(),
            role_id: 2,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let security = security();
        let (token, claims) = issue_token(subject(), &security).unwrap();
        let decoded = verify_token(&token, &security).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.sub, 7);
        assert_eq!(decoded.role_id, 2);
        assert!(decoded.expires_in() > 0);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let security = security();
        let (token, _) = issue_token(subject(), &security).unwrap();

        let mut other = security.clone();
        other.jwt_secret = "another-secret".to_string();
        assert!(matches!(verify_token(&token, &other), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let security = security();
        let (token, _) = issue_token(subject(), &security).unwrap();

        let mut other = security.clone();
        other.jwt_issuer = "someone-else".to_string();
        assert!(matches!(verify_token(&token, &other), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let security = security();
        let mut claims = Claims::new(subject(), &security);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(security.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(verify_token(&token, &security), Err(JwtError::Expired)));
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        let mut security = security();
        security.jwt_secret.clear();
        assert!(matches!(issue_token(subject(), &security), Err(JwtError::MissingSecret)));
        assert!(matches!(verify_token("a.b.c", &security), Err(JwtError::MissingSecret)));
    }
}
