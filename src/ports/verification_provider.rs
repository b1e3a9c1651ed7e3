//! Verification provider port.
//!
//! Abstracts the remote identity-verification service. The provider owns
//! liveness scoring, OCR and face matching; this service only creates
//! applicants, forwards artifacts and reads back review results.
//!
//! # Error Handling
//!
//! Every call reports failures as [`ProviderError`]. Timeouts are kept apart
//! from other failures so the HTTP layer can answer 504 instead of 502.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::SessionId;
use crate::domain::verification::{Artifact, DecodedImage, VerificationError};

/// Port for the identity-verification provider.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Register a new applicant under a verification level.
    async fn create_applicant(
        &self,
        request: CreateApplicantRequest,
    ) -> Result<Applicant, ProviderError>;

    /// Upload a selfie or a document side for an applicant.
    async fn upload_artifact(
        &self,
        applicant_id: &SessionId,
        artifact: &Artifact,
        image: &DecodedImage,
    ) -> Result<UploadedArtifact, ProviderError>;

    /// Fetch the applicant's current review state.
    async fn get_review(&self, applicant_id: &SessionId) -> Result<ApplicantReview, ProviderError>;

    /// Issue a short-lived token for the provider's client SDK.
    async fn create_access_token(
        &self,
        external_user_id: &str,
        level_name: &str,
    ) -> Result<AccessToken, ProviderError>;
}

/// Request to create an applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateApplicantRequest {
    pub external_user_id: String,
    pub level_name: String,
}

/// Applicant as created by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: String,
    pub external_user_id: String,
    pub level_name: String,
    /// Full provider response.
    pub raw: Value,
}

/// Result of an artifact upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedArtifact {
    /// Provider image id, when the provider reports one.
    pub image_id: Option<String>,
    pub raw: Value,
}

/// Review state reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantReview {
    pub review_status: String,
    pub review_answer: Option<String>,
    pub raw: Value,
}

/// Token for the provider's client SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub user_id: String,
}

/// Provider error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
    /// HTTP status returned by the provider, if any.
    pub http_status: Option<u16>,
    pub retryable: bool,
}

impl ProviderError {
    /// Create a new provider error.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            http_status: None,
            retryable: code.is_retryable(),
        }
    }

    /// Attach the provider's HTTP status.
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            401 | 403 => ProviderErrorCode::AuthenticationError,
            404 => ProviderErrorCode::NotFound,
            429 => ProviderErrorCode::RateLimitExceeded,
            400..=499 => ProviderErrorCode::Rejected,
            _ => ProviderErrorCode::ServerError,
        };
        Self::new(code, message).with_http_status(status)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for VerificationError {
    fn from(err: ProviderError) -> Self {
        match err.code {
            ProviderErrorCode::Timeout => VerificationError::upstream_timeout(err.message),
            _ => VerificationError::upstream(err.to_string()),
        }
    }
}

/// Provider error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorCode {
    /// No response within the configured timeout.
    Timeout,

    /// Connection failure.
    NetworkError,

    /// Provider rejected our credentials or signature.
    AuthenticationError,

    /// Resource not found at the provider.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Provider rejected the request content.
    Rejected,

    /// Provider 5xx.
    ServerError,

    /// Response could not be understood.
    InvalidResponse,
}

impl ProviderErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorCode::Timeout
                | ProviderErrorCode::NetworkError
                | ProviderErrorCode::RateLimitExceeded
                | ProviderErrorCode::ServerError
        )
    }
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderErrorCode::Timeout => "timeout",
            ProviderErrorCode::NetworkError => "network_error",
            ProviderErrorCode::AuthenticationError => "authentication_error",
            ProviderErrorCode::NotFound => "not_found",
            ProviderErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            ProviderErrorCode::Rejected => "rejected",
            ProviderErrorCode::ServerError => "server_error",
            ProviderErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn VerificationProvider) {}
    }

    #[test]
    fn from_status_classifies_codes() {
        assert_eq!(ProviderError::from_status(401, "x").code, ProviderErrorCode::AuthenticationError);
        assert_eq!(ProviderError::from_status(404, "x").code, ProviderErrorCode::NotFound);
        assert_eq!(ProviderError::from_status(429, "x").code, ProviderErrorCode::RateLimitExceeded);
        assert_eq!(ProviderError::from_status(400, "x").code, ProviderErrorCode::Rejected);
        assert_eq!(ProviderError::from_status(503, "x").code, ProviderErrorCode::ServerError);
        assert_eq!(ProviderError::from_status(503, "x").http_status, Some(503));
    }

    #[test]
    fn retryable_codes() {
        assert!(ProviderError::timeout("slow").retryable);
        assert!(ProviderError::from_status(502, "bad gateway").retryable);
        assert!(!ProviderError::from_status(400, "bad image").retryable);
    }

    #[test]
    fn timeout_maps_to_upstream_timeout() {
        let err: VerificationError = ProviderError::timeout("30s elapsed").into();
        assert!(matches!(err, VerificationError::UpstreamTimeout(_)));
    }

    #[test]
    fn other_failures_map_to_upstream() {
        let err: VerificationError = ProviderError::from_status(500, "boom").into();
        assert!(matches!(err, VerificationError::Upstream(_)));

        let err: VerificationError = ProviderError::invalid_response("no id").into();
        assert!(matches!(err, VerificationError::Upstream(_)));
    }

    #[test]
    fn display_includes_code() {
        let err = ProviderError::network("connection refused");
        assert_eq!(err.to_string(), "network_error: connection refused");
    }
}
