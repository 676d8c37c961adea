//! JWT (JSON Web Token) utilities for authentication.
//!
//! This module provides functions for creating and verifying the two token
//! kinds used by the Tapak API:
//!
//! - **Access tokens**: Short-lived tokens for API authentication
//! - **Refresh tokens**: Long-lived tokens for obtaining new access tokens
//!
//! The auth middleware does not call these functions directly; it goes
//! through the [`TokenVerifier`] trait so tests can substitute a double.
//!
//! # Example
//!
//! ```ignore
//! use tapak_auth::{create_access_token, verify_token};
//! use tapak_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//!
//! let token = create_access_token(user_id, "user@example.com", &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use tapak_config::JwtConfig;
use tapak_core::AppError;

use crate::claims::{Claims, RefreshTokenClaims, TokenType};

/// Verifies a raw access token and yields its claims.
///
/// Implementations must not distinguish failure reasons in the returned
/// error; callers collapse every failure into the same 401.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AppError>;
}

/// [`TokenVerifier`] backed by HS256 JWTs.
#[derive(Clone, Debug)]
pub struct JwtVerifier {
    config: JwtConfig,
}

impl JwtVerifier {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Claims, AppError> {
        verify_token(token, &self.config)
    }
}

/// Creates an access token for a user.
///
/// # Arguments
///
/// * `user_id` - The user's UUID
/// * `email` - The user's email address
/// * `jwt_config` - JWT configuration containing the secret and expiry settings
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = (now + jwt_config.access_token_expiry) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        typ: TokenType::Access,
        exp,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow!("Failed to create token: {}", e)))
}

/// Verifies an access token and returns the embedded claims.
///
/// # Errors
///
/// Returns an unauthorized error if the signature is invalid, the token has
/// expired, the token is malformed, or it is a refresh token.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow!("Invalid or expired token")))?;

    if claims.typ != TokenType::Access {
        return Err(AppError::unauthorized(anyhow!("Invalid or expired token")));
    }

    Ok(claims)
}

/// Creates a refresh token for obtaining new access tokens.
///
/// Each call embeds a fresh `jti`, so rotating a refresh token always
/// produces a different string.
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = (now + jwt_config.refresh_token_expiry) as usize;

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        typ: TokenType::Refresh,
        exp,
        iat: now as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow!("Failed to create refresh token: {}", e)))
}

/// Verifies a refresh token and returns the claims.
///
/// # Errors
///
/// Returns an unauthorized error if the token is invalid, expired, or an
/// access token.
pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    let claims = decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow!("Invalid or expired refresh token")))?;

    if claims.typ != TokenType::Refresh {
        return Err(AppError::unauthorized(anyhow!("Invalid or expired refresh token")));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    #[test]
    fn test_create_and_verify_access_token() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token = create_access_token(user_id, "test@example.com", &config).unwrap();
        assert!(!token.is_empty());

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.typ, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_token_invalid() {
        let config = get_test_jwt_config();
        let err = verify_token("invalid-token", &config).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = get_test_jwt_config();
        let token = create_access_token(Uuid::new_v4(), "test@example.com", &config).unwrap();

        let wrong_config = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            ..get_test_jwt_config()
        };

        assert!(verify_token(&token, &wrong_config).is_err());
    }

    #[test]
    fn test_verify_token_expired() {
        let config = JwtConfig {
            access_token_expiry: -120,
            ..get_test_jwt_config()
        };
        let token = create_access_token(Uuid::new_v4(), "test@example.com", &config).unwrap();
        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token = create_refresh_token(user_id, "test@example.com", &config).unwrap();
        let claims = verify_refresh_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.typ, TokenType::Refresh);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let a = create_refresh_token(user_id, "test@example.com", &config).unwrap();
        let b = create_refresh_token(user_id, "test@example.com", &config).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = get_test_jwt_config();
        let refresh = create_refresh_token(Uuid::new_v4(), "test@example.com", &config).unwrap();
        assert!(verify_token(&refresh, &config).is_err());
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let config = get_test_jwt_config();
        let access = create_access_token(Uuid::new_v4(), "test@example.com", &config).unwrap();
        assert!(verify_refresh_token(&access, &config).is_err());
    }

    #[test]
    fn test_jwt_verifier_delegates() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, "v@example.com", &config).unwrap();

        let verifier = JwtVerifier::new(config);
        assert_eq!(verifier.verify(&token).unwrap().sub, user_id.to_string());
        assert!(verifier.verify("garbage").is_err());
    }
}
