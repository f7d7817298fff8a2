//! Session tokens: HS256 JWTs carrying the user and the active workspace.

use std::fmt;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;

/// Claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub workspace_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign session token: {0}")]
    Encode(jsonwebtoken::errors::Error),
    #[error("invalid session token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Issues and verifies session tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.jwt_secret().as_bytes(), config.session_ttl_seconds)
    }

    /// Session lifetime; also used as the cookie `Max-Age`.
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        workspace_id: Uuid,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id,
            email: email.to_string(),
            workspace_id,
            iat: now,
            exp: now + self.ttl_seconds as i64,
        };
        self.sign(&claims)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-with-at-least-32-bytes!!";

    #[test]
    fn issued_token_verifies_with_same_claims() {
        let service = TokenService::new(SECRET, 3600);
        let user_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();

        let token = service.issue(user_id, "ana@example.com", workspace_id).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.workspace_id, workspace_id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenService::new(b"another-secret-with-at-least-32-bytes", 3600);
        let verifier = TokenService::new(SECRET, 3600);

        let token = issuer
            .issue(Uuid::new_v4(), "ana@example.com", Uuid::new_v4())
            .unwrap();

        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(SECRET, 3600);
        let issued_at = Utc::now().timestamp() - 7200;
        let token = service
            .sign(&SessionClaims {
                sub: Uuid::new_v4(),
                email: "ana@example.com".to_string(),
                workspace_id: Uuid::new_v4(),
                iat: issued_at,
                exp: issued_at + 3600,
            })
            .unwrap();

        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let service = TokenService::new(SECRET, 3600);
        assert!(service.verify("not.a.jwt").is_err());
    }
}
