//! Client authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

const MIN_API_KEY_LEN: usize = 16;

#[derive(Clone, Deserialize)]
pub struct SecurityConfig {
    /// Key expected in `X-API-Key` on client routes
    pub api_key: SecretString,
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let key = self.api_key.expose_secret();
        if key.is_empty() {
            return Err(ValidationError::MissingRequired("SECURITY__API_KEY"));
        }
        if key.len() < MIN_API_KEY_LEN {
            return Err(ValidationError::ApiKeyTooShort(MIN_API_KEY_LEN));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str) -> SecurityConfig {
        SecurityConfig {
            api_key: SecretString::new(key.to_string()),
        }
    }

    #[test]
    fn test_key_length() {
        assert_eq!(
            config("").validate(),
            Err(ValidationError::MissingRequired("SECURITY__API_KEY"))
        );
        assert_eq!(
            config("short").validate(),
            Err(ValidationError::ApiKeyTooShort(16))
        );
        assert!(config("0123456789abcdef").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        assert!(!format!("{:?}", config("0123456789abcdef")).contains("0123"));
    }
}
