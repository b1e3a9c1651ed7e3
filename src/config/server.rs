//! HTTP listener, logging and CORS settings

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound for the whole-request timeout.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind; hostnames are not resolved
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub environment: Environment,

    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON log lines; defaults to on in production only
    pub json_logs: Option<bool>,

    /// Whole-request timeout, covering the provider round trip
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Comma-separated browser origins; unset or `*` allows any
    pub cors_origins: Option<String>,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .map_err(|_| ValidationError::InvalidBindAddress(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn json_logs(&self) -> bool {
        self.json_logs.unwrap_or_else(|| self.is_production())
    }

    /// Explicit origins; empty means any origin is allowed.
    pub fn cors_origins_list(&self) -> Vec<String> {
        let origins: Vec<String> = self
            .cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if origins.iter().any(|origin| origin == "*") {
            Vec::new()
        } else {
            origins
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        self.socket_addr()?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            json_logs: None,
            request_timeout_secs: default_request_timeout(),
            cors_origins: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info,biometric_gateway=debug,sqlx=warn,tower_http=info".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(!config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn hostname_is_not_a_bind_address() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidBindAddress("localhost".to_string()))
        );
    }

    #[test]
    fn production_logs_json_unless_overridden() {
        let mut config = ServerConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        assert!(config.is_production());
        assert!(config.json_logs());

        config.json_logs = Some(false);
        assert!(!config.json_logs());
    }

    #[test]
    fn cors_origins_are_trimmed() {
        let config = ServerConfig {
            cors_origins: Some("https://app.example.com, ,http://localhost:3000".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.cors_origins_list(),
            vec!["https://app.example.com", "http://localhost:3000"]
        );
    }

    #[test]
    fn wildcard_origin_allows_any() {
        let config = ServerConfig {
            cors_origins: Some("*".to_string()),
            ..Default::default()
        };
        assert!(config.cors_origins_list().is_empty());
    }

    #[test]
    fn rejects_zero_port_and_bad_timeouts() {
        let zero_port = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(zero_port.validate(), Err(ValidationError::InvalidPort));

        for secs in [0, MAX_REQUEST_TIMEOUT_SECS + 1] {
            let config = ServerConfig {
                request_timeout_secs: secs,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
        }
    }
}
