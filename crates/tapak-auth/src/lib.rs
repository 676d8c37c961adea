//! # Tapak Auth
//!
//! Authentication building blocks for the Tapak API.
//!
//! This crate provides:
//!
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token creation and verification, plus the [`TokenVerifier`] seam
//!   used by the auth middleware
//! - [`cookies`]: [`CookieHelper`] for the `access_token` / `refresh_token` cookies
//! - [`policy`]: The [`PermissionChecker`] seam and the in-memory [`PolicyTable`]
//!
//! # Token Types
//!
//! - **Access Token** ([`Claims`]): Short-lived token for API authentication
//! - **Refresh Token** ([`RefreshTokenClaims`]): Long-lived token for obtaining new access tokens
//!
//! Both carry a `typ` claim so one can never be accepted in place of the other.
//!
//! # Example
//!
//! ```ignore
//! use tapak_auth::{JwtVerifier, TokenVerifier, create_access_token};
//! use tapak_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "user@example.com", &config)?;
//!
//! let verifier = JwtVerifier::new(config);
//! let claims = verifier.verify(&token)?;
//! println!("User ID: {}", claims.sub);
//! ```

pub mod claims;
pub mod cookies;
pub mod jwt;
pub mod policy;

// Re-export commonly used types at crate root
pub use claims::{Claims, RefreshTokenClaims, TokenType};
pub use cookies::{ACCESS_TOKEN_COOKIE, CookieHelper, REFRESH_TOKEN_COOKIE};
pub use jwt::{
    JwtVerifier, TokenVerifier, create_access_token, create_refresh_token, verify_refresh_token,
    verify_token,
};
pub use policy::{PermissionChecker, PolicyError, PolicyTable};
