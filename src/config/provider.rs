//! Verification provider configuration (Sumsub)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::sumsub::{SumsubConfig, DEFAULT_BASE_URL};
use crate::application::handlers::verification::VerificationLevels;

/// Provider credentials, levels and timeout.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// API host; the sandbox unless overridden
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Application token sent as `X-App-Token`
    #[serde(default = "empty_secret")]
    pub app_token: SecretString,

    /// Secret for signing outbound requests
    #[serde(default = "empty_secret")]
    pub secret_key: SecretString,

    /// Secret for verifying callback digests
    #[serde(default = "empty_secret")]
    pub webhook_secret: SecretString,

    /// Level used for liveness applicants
    #[serde(default = "default_liveness_level")]
    pub liveness_level_name: String,

    /// Level used for KYC applicants
    #[serde(default = "default_kyc_level")]
    pub kyc_level_name: String,

    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn levels(&self) -> VerificationLevels {
        VerificationLevels::new(&self.liveness_level_name, &self.kyc_level_name)
    }

    /// Adapter configuration for the Sumsub client.
    pub fn sumsub_config(&self) -> SumsubConfig {
        SumsubConfig::new(
            self.app_token.expose_secret().clone(),
            self.secret_key.expose_secret().clone(),
        )
        .with_base_url(&self.base_url)
        .with_timeout(self.request_timeout())
    }

    /// Check if pointed at the provider sandbox
    pub fn is_sandbox(&self) -> bool {
        self.base_url.contains("sandbox")
    }

    /// Validate provider configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.app_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PROVIDER__APP_TOKEN"));
        }
        if self.secret_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PROVIDER__SECRET_KEY"));
        }
        if self.webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PROVIDER__WEBHOOK_SECRET"));
        }
        if self.liveness_level_name.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PROVIDER__LIVENESS_LEVEL_NAME"));
        }
        if self.kyc_level_name.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PROVIDER__KYC_LEVEL_NAME"));
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidProviderUrl);
        }
        if production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::ProviderUrlMustBeHttps);
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("app_token", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("liveness_level_name", &self.liveness_level_name)
            .field("kyc_level_name", &self.kyc_level_name)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_liveness_level() -> String {
    "liveness-only".to_string()
}

fn default_kyc_level() -> String {
    "basic-kyc-level".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig {
            base_url: default_base_url(),
            app_token: SecretString::new("sbx:app-token".to_string()),
            secret_key: SecretString::new("signing-secret".to_string()),
            webhook_secret: SecretString::new("hook-secret".to_string()),
            liveness_level_name: default_liveness_level(),
            kyc_level_name: default_kyc_level(),
            request_timeout_secs: default_timeout(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = config();
        assert!(config.validate(false).is_ok());
        assert!(config.is_sandbox());
        assert_eq!(config.levels().kyc, "basic-kyc-level");
    }

    #[test]
    fn test_missing_secrets() {
        let config = ProviderConfig {
            webhook_secret: empty_secret(),
            ..config()
        };
        assert_eq!(
            config.validate(false),
            Err(ValidationError::MissingRequired("PROVIDER__WEBHOOK_SECRET"))
        );
    }

    #[test]
    fn test_production_requires_https() {
        let config = ProviderConfig {
            base_url: "http://localhost:9000".to_string(),
            ..config()
        };
        assert!(config.validate(false).is_ok());
        assert_eq!(
            config.validate(true),
            Err(ValidationError::ProviderUrlMustBeHttps)
        );
    }

    #[test]
    fn test_timeout_bounds() {
        let config = ProviderConfig {
            request_timeout_secs: 0,
            ..config()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_sumsub_config_carries_settings() {
        let config = ProviderConfig {
            base_url: "https://api.sumsub.com/".to_string(),
            request_timeout_secs: 12,
            ..config()
        };
        let sumsub = config.sumsub_config();
        assert_eq!(sumsub.base_url(), "https://api.sumsub.com");
        assert_eq!(sumsub.timeout(), Duration::from_secs(12));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("signing-secret"));
        assert!(!rendered.contains("hook-secret"));
        assert!(!rendered.contains("sbx:app-token"));
    }
}
