//! Verification-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Authentication | 401 |
//! | ValidationFailed | 400 |
//! | SessionNotFound | 404 |
//! | InvalidState | 409 |
//! | Upstream | 502 |
//! | UpstreamTimeout | 504 |
//! | Infrastructure | 500 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

use super::signature::SignatureError;

/// Errors surfaced by verification operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Missing or invalid signature or API key.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Malformed input.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// No session matches the given identifier.
    #[error("Verification session not found: {0}")]
    SessionNotFound(String),

    /// The session cannot accept the requested operation.
    #[error("Cannot {attempted} session in {current} state")]
    InvalidState { current: String, attempted: String },

    /// Provider did not answer within the configured timeout.
    #[error("Verification provider timed out: {0}")]
    UpstreamTimeout(String),

    /// Provider unreachable or returned an unusable response.
    #[error("Verification provider error: {0}")]
    Upstream(String),

    /// Database or other internal failure.
    #[error("Internal error: {0}")]
    Infrastructure(String),
}

impl VerificationError {
    pub fn authentication(reason: impl Into<String>) -> Self {
        VerificationError::Authentication(reason.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        VerificationError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn session_not_found(id: impl Into<String>) -> Self {
        VerificationError::SessionNotFound(id.into())
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        VerificationError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn upstream_timeout(message: impl Into<String>) -> Self {
        VerificationError::UpstreamTimeout(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        VerificationError::Upstream(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        VerificationError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            VerificationError::Authentication(_) => ErrorCode::AuthenticationFailed,
            VerificationError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            VerificationError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            VerificationError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            VerificationError::UpstreamTimeout(_) => ErrorCode::UpstreamTimeout,
            VerificationError::Upstream(_) => ErrorCode::UpstreamError,
            VerificationError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Returns true if the caller should retry later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VerificationError::UpstreamTimeout(_) | VerificationError::Upstream(_)
        )
    }
}

impl From<ValidationError> for VerificationError {
    fn from(err: ValidationError) -> Self {
        VerificationError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<SignatureError> for VerificationError {
    fn from(err: SignatureError) -> Self {
        VerificationError::Authentication(err.to_string())
    }
}

impl From<DomainError> for VerificationError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::SessionNotFound => VerificationError::SessionNotFound(err.message),
            ErrorCode::ValidationFailed => VerificationError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => VerificationError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_codes() {
        assert_eq!(
            VerificationError::authentication("bad sig").code(),
            ErrorCode::AuthenticationFailed
        );
        assert_eq!(
            VerificationError::invalid_state("completed", "submit artifact to").code(),
            ErrorCode::InvalidStateTransition
        );
        assert_eq!(
            VerificationError::upstream_timeout("30s").code(),
            ErrorCode::UpstreamTimeout
        );
    }

    #[test]
    fn only_upstream_errors_are_retryable() {
        assert!(VerificationError::upstream("502").is_retryable());
        assert!(VerificationError::upstream_timeout("slow").is_retryable());
        assert!(!VerificationError::infrastructure("db").is_retryable());
        assert!(!VerificationError::session_not_found("x").is_retryable());
    }

    #[test]
    fn signature_errors_become_authentication() {
        let err: VerificationError = SignatureError::Mismatch.into();
        assert!(matches!(err, VerificationError::Authentication(_)));
    }

    #[test]
    fn validation_error_keeps_field() {
        let err: VerificationError = ValidationError::empty_field("user_id").into();
        assert!(matches!(
            err,
            VerificationError::ValidationFailed { ref field, .. } if field == "user_id"
        ));
    }

    #[test]
    fn domain_not_found_maps_to_session_not_found() {
        let err: VerificationError =
            DomainError::new(ErrorCode::SessionNotFound, "abc").into();
        assert_eq!(err, VerificationError::SessionNotFound("abc".to_string()));
    }

    #[test]
    fn database_errors_become_infrastructure() {
        let err: VerificationError = DomainError::database("connection reset").into();
        assert!(matches!(err, VerificationError::Infrastructure(_)));
    }

    #[test]
    fn invalid_state_message_names_both_sides() {
        let err = VerificationError::invalid_state("rejected", "submit artifact to");
        assert_eq!(err.to_string(), "Cannot submit artifact to session in rejected state");
    }
}
