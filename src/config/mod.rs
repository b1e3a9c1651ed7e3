//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BIOMETRIC` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use biometric_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod limits;
mod provider;
mod security;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use limits::LimitsConfig;
pub use provider::ProviderConfig;
pub use security::SecurityConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
/// Every section with secrets redacts them in `Debug` output.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Verification provider configuration (Sumsub)
    pub provider: ProviderConfig,

    /// Client authentication
    pub security: SecurityConfig,

    /// Request size limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BIOMETRIC` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BIOMETRIC__SERVER__PORT=8000` -> `server.port = 8000`
    /// - `BIOMETRIC__PROVIDER__SECRET_KEY=...` -> `provider.secret_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BIOMETRIC")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.provider.validate(self.is_production())?;
        self.security.validate()?;
        self.limits.validate()?;

        // A slow provider must surface as 504, not as the server's own timeout.
        if self.server.request_timeout_secs <= self.provider.request_timeout_secs {
            return Err(ValidationError::RequestTimeoutTooShort(
                self.provider.request_timeout_secs,
            ));
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
