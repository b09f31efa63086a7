//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults.

use std::env;
use std::sync::OnceLock;

/// Deployment environment. Controls how much detail internal errors leak
/// to clients: full messages in development, a generic message in
/// production (the detail is always logged).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

impl Environment {
    /// The process-wide environment, defaulting to Production so an
    /// unconfigured deployment never leaks internals.
    pub fn current() -> Environment {
        *ENVIRONMENT.get().unwrap_or(&Environment::Production)
    }

    /// Pins the process-wide environment. Later calls are no-ops.
    pub fn set(environment: Environment) {
        let _ = ENVIRONMENT.set(environment);
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file path
    pub database_path: String,

    /// Deployment environment (development | production)
    pub environment: Environment,

    /// Name of the trusted header carrying the identity-provider subject
    pub identity_header: String,

    /// Admin username for the legacy credential check
    pub admin_username: String,

    /// Argon2 PHC hash of the admin password. The check is disabled
    /// entirely when unset.
    pub admin_password_hash: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "development" | "dev" => Environment::Development,
            "production" | "prod" => Environment::Production,
            other => return Err(ConfigError::InvalidValue(format!("ENVIRONMENT={other}"))),
        };

        let config = ApiConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./restyle.db".to_string()),

            environment,

            identity_header: env::var("IDENTITY_HEADER")
                .unwrap_or_else(|_| "x-external-id".to_string())
                .to_lowercase(),

            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),

            admin_password_hash: env::var("ADMIN_PASSWORD_HASH").ok(),
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_default_is_production() {
        // The OnceLock is untouched in this test binary until set
        assert_eq!(Environment::current(), Environment::Production);
        Environment::set(Environment::Development);
        assert!(Environment::current().is_development());
    }
}
