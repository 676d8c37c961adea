//! Resumable upload (TUS) protocol parameters.
//!
//! - `TUS_VERSION`: the only protocol version accepted (default `1.0.0`)
//! - `TUS_MAX_SIZE`: largest upload in bytes (default 500 MiB)

use std::env;

pub const DEFAULT_TUS_VERSION: &str = "1.0.0";
pub const DEFAULT_TUS_MAX_SIZE: u64 = 524_288_000;

/// Extensions advertised in `Tus-Extension`.
pub const TUS_EXTENSIONS: &str = "creation,termination";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TusConfig {
    pub version: String,
    pub max_size: u64,
}

impl Default for TusConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TUS_VERSION, DEFAULT_TUS_MAX_SIZE)
    }
}

impl TusConfig {
    pub fn new(version: impl Into<String>, max_size: u64) -> Self {
        Self {
            version: version.into(),
            max_size,
        }
    }

    pub fn from_env() -> Self {
        Self {
            version: env::var("TUS_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_TUS_VERSION.to_string()),
            max_size: env::var("TUS_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TUS_MAX_SIZE),
        }
    }
}
