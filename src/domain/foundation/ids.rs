//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Verification session identifier.
///
/// This is the applicant id issued by the verification provider when the
/// session is created, so it is an opaque string rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new SessionId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("session_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_rejects_empty() {
        assert!(SessionId::new("").is_err());
        assert!(SessionId::new("   ").is_err());
    }

    #[test]
    fn session_id_keeps_provider_value() {
        let id = SessionId::new("5f1a2b3c4d5e6f7a8b9c0d1e").unwrap();
        assert_eq!(id.as_str(), "5f1a2b3c4d5e6f7a8b9c0d1e");
        assert_eq!(id.to_string(), "5f1a2b3c4d5e6f7a8b9c0d1e");
    }

    #[test]
    fn user_id_rejects_empty() {
        let err = UserId::new("").unwrap_err();
        assert_eq!(err, ValidationError::empty_field("user_id"));
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = SessionId::new("abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
