//! # Tapak Config
//!
//! Configuration types for the Tapak API.
//!
//! Every structure is loaded from environment variables with a `from_env()`
//! constructor and falls back to sensible defaults:
//!
//! - [`app`]: Environment name, bind host and port
//! - [`jwt`]: JWT authentication configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`rate_limit`]: API rate limiting configuration
//! - [`tus`]: Resumable upload protocol parameters
//! - [`upload`]: Upload storage location
//!
//! # Example
//!
//! ```ignore
//! use tapak_config::{AppConfig, JwtConfig, TusConfig};
//!
//! let app_config = AppConfig::from_env();
//! let jwt_config = JwtConfig::from_env();
//! let tus_config = TusConfig::from_env();
//! ```

pub mod app;
pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod tus;
pub mod upload;

// Re-export commonly used types at crate root
pub use app::AppConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use tus::TusConfig;
pub use upload::UploadConfig;
