use std::env;

pub const PRODUCTION: &str = "production";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Deployment environment (`APP_ENV`), e.g. `development` or `production`.
    pub environment: String,
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            environment: env::var("APP_ENV").unwrap_or(defaults.environment),
            host: env::var("APP_HOST").unwrap_or(defaults.host),
            port: env::var("APP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_production() {
        let config = AppConfig::default();
        assert!(!config.is_production());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_production_flag_is_exact_match() {
        let mut config = AppConfig::default();
        config.environment = "production".to_string();
        assert!(config.is_production());

        config.environment = "Production".to_string();
        assert!(!config.is_production());
    }
}
