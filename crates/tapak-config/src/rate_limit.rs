//! Rate limiting configuration for API endpoints.
//!
//! Rate limits are enforced per client IP using the Governor crate. Auth
//! endpoints get a stricter bucket than the rest of the API.
//!
//! # Configuration
//!
//! - `RATE_LIMIT_ENABLED`: Set to `false` to disable limiting entirely (default: true)
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: Requests per second for general endpoints (default: 20)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: Burst size for general endpoints (default: 60)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: Requests per second for auth endpoints (default: 2)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: Burst size for auth endpoints (default: 5)
//! - `RATE_LIMIT_TRUST_PROXY`: Key clients by `X-Forwarded-For` / `X-Real-IP`
//!   instead of the socket peer address (default: false). Only enable behind
//!   a reverse proxy that overwrites these headers.
//!
//! # Rate Limiting Strategy
//!
//! The rate limiter uses a token bucket algorithm:
//!
//! - Tokens are added at the configured rate (per second)
//! - Each request consumes one token
//! - Burst size defines the maximum tokens that can accumulate
//! - Requests are rejected when no tokens are available
//!
//! # Example
//!
//! ```ignore
//! use tapak_config::RateLimitConfig;
//!
//! let config = RateLimitConfig::from_env();
//! let limiter = governor::RateLimiter::keyed(config.auth_quota());
//! ```

use std::env;
use std::num::NonZeroU32;

use governor::Quota;

/// Rate limit configuration for the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Whether limiting is applied at all.
    pub enabled: bool,

    /// Requests per second for general endpoints.
    ///
    /// This is the rate at which tokens are replenished in the bucket.
    pub general_per_second: u32,

    /// Burst size for general endpoints.
    ///
    /// This is the maximum number of tokens that can accumulate,
    /// allowing short bursts of traffic above the per-second rate.
    pub general_burst_size: u32,

    /// Requests per second for auth endpoints (stricter).
    ///
    /// Auth endpoints have stricter limits to slow down credential
    /// guessing against login and refresh.
    pub auth_per_second: u32,

    /// Burst size for auth endpoints (stricter).
    pub auth_burst_size: u32,

    /// Whether forwarding headers identify the client. When false the peer
    /// address is the only key, so clients cannot pick their own bucket.
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 20,
            general_burst_size: 60,
            auth_per_second: 2,
            auth_burst_size: 5,
            trust_proxy: false,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

impl RateLimitConfig {
    /// Creates a new `RateLimitConfig` from environment variables.
    ///
    /// Falls back to default values if environment variables are not set
    /// or cannot be parsed.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_or("RATE_LIMIT_ENABLED", defaults.enabled),
            general_per_second: env_or("RATE_LIMIT_GENERAL_PER_SECOND", defaults.general_per_second),
            general_burst_size: env_or("RATE_LIMIT_GENERAL_BURST_SIZE", defaults.general_burst_size),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
            trust_proxy: env_or("RATE_LIMIT_TRUST_PROXY", defaults.trust_proxy),
        }
    }

    /// Configuration with limiting turned off, for tests.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Quota for general API endpoints. Zero values are raised to 1.
    #[must_use]
    pub fn general_quota(&self) -> Quota {
        Quota::per_second(non_zero(self.general_per_second))
            .allow_burst(non_zero(self.general_burst_size))
    }

    /// Quota for authentication endpoints.
    #[must_use]
    pub fn auth_quota(&self) -> Quota {
        Quota::per_second(non_zero(self.auth_per_second))
            .allow_burst(non_zero(self.auth_burst_size))
    }
}
