//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Server request timeout must exceed the provider timeout ({0}s)")]
    RequestTimeoutTooShort(u64),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Provider base URL must be an http(s) URL")]
    InvalidProviderUrl,

    #[error("Provider base URL must use HTTPS in production")]
    ProviderUrlMustBeHttps,

    #[error("Image size limit must be between 1 byte and 50 MiB")]
    InvalidImageLimit,

    #[error("API key must be at least {0} characters")]
    ApiKeyTooShort(usize),
}
