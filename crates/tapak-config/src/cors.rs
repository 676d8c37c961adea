//! Browser origins allowed to call the API with credentials.
//!
//! `ALLOWED_ORIGINS` is a comma-separated list. Entries are trimmed, a
//! trailing `/` is dropped (browsers never send one in `Origin`), duplicates
//! are removed, and anything that is not an `http://` or `https://` origin is
//! ignored. A wildcard cannot be combined with cookie credentials, so `*` is
//! ignored as well.

use std::env;

pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::parse(DEFAULT_ALLOWED_ORIGINS)
    }
}

fn normalize(entry: &str) -> Option<String> {
    let origin = entry.trim().trim_end_matches('/');
    let host = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))?;

    if host.is_empty() || host.contains('/') {
        return None;
    }
    Some(origin.to_ascii_lowercase())
}

impl CorsConfig {
    pub fn parse(raw: &str) -> Self {
        let mut allowed_origins: Vec<String> = Vec::new();
        for origin in raw.split(',').filter_map(normalize) {
            if !allowed_origins.contains(&origin) {
                allowed_origins.push(origin);
            }
        }
        Self { allowed_origins }
    }

    pub fn from_env() -> Self {
        match env::var("ALLOWED_ORIGINS") {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Self::default(),
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        normalize(origin).is_some_and(|origin| self.allowed_origins.contains(&origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origins() {
        let config = CorsConfig::default();
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_parse_trims_and_dedups() {
        let config = CorsConfig::parse(
            " https://app.tapak.id/ ,https://APP.tapak.id,,http://localhost:5173 ",
        );
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.tapak.id", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_parse_ignores_non_origins() {
        let config = CorsConfig::parse("*,ftp://files.tapak.id,https://,https://tapak.id/app,tapak.id");
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_allows() {
        let config = CorsConfig::parse("https://app.tapak.id");
        assert!(config.allows("https://app.tapak.id"));
        assert!(config.allows("https://app.tapak.id/"));
        assert!(!config.allows("https://evil.example"));
        assert!(!config.allows("null"));
    }
}
