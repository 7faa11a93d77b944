//! API configuration

use serde::Deserialize;

use core_kernel::{TemporalError, Timezone};

/// API configuration
///
/// Loaded from `API_*` environment variables, e.g. `API_PORT=8080` or
/// `API_BUSINESS_TIMEZONE=Asia/Ho_Chi_Minh`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Upper bound of the connection pool
    pub max_connections: u32,
    /// Log level
    pub log_level: String,
    /// IANA zone in which warranty end dates are compared
    pub business_timezone: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/warranty".to_string(),
            max_connections: 10,
            log_level: "info".to_string(),
            business_timezone: "Asia/Ho_Chi_Minh".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment, falling back to the defaults
    /// for anything unset
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_expiration_secs", defaults.jwt_expiration_secs as i64)?
            .set_default("database_url", defaults.database_url)?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("log_level", defaults.log_level)?
            .set_default("business_timezone", defaults.business_timezone)?
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timezone(&self) -> Result<Timezone, TemporalError> {
        Timezone::from_name(&self.business_timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timezone_is_ho_chi_minh() {
        let config = ApiConfig::default();
        assert_eq!(config.timezone().unwrap(), Timezone::vietnam());
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let config = ApiConfig {
            business_timezone: "Mars/Olympus".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.timezone().is_err());
    }
}
