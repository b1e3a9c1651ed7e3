//! Database configuration

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use super::error::ValidationError;

/// PostgreSQL pool settings for the session and user stores.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. May embed credentials, so it is never logged.
    pub url: String,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,

    /// Apply `migrations/` on startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    /// Pool options built from these settings.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout())
            .idle_timeout(Some(self.idle_timeout()))
            .max_lifetime(Some(self.max_lifetime()))
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE__URL"));
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > 100 {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("min_connections", &self.min_connections)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            run_migrations: false,
        }
    }
}

fn default_min_connections() -> u32 {
    2
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_lifetime() -> u64 {
    1800
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> DatabaseConfig {
        DatabaseConfig {
            url: "postgresql://gateway:pw@localhost:5432/biometric".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(10));
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_validation_missing_url() {
        assert_eq!(
            DatabaseConfig::default().validate(),
            Err(ValidationError::MissingRequired("DATABASE__URL"))
        );
    }

    #[test]
    fn test_validation_rejects_non_postgres_url() {
        let config = DatabaseConfig {
            url: "mongodb+srv://localhost:27017".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidDatabaseUrl));
    }

    #[test]
    fn test_validation_pool_bounds() {
        let inverted = DatabaseConfig {
            min_connections: 20,
            max_connections: 5,
            ..valid()
        };
        assert_eq!(inverted.validate(), Err(ValidationError::InvalidPoolSize));

        let huge = DatabaseConfig {
            max_connections: 150,
            ..valid()
        };
        assert_eq!(huge.validate(), Err(ValidationError::PoolSizeTooLarge));

        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_debug_hides_url() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("pw@"));
    }
}
