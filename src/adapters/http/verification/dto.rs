//! HTTP DTOs (Data Transfer Objects) for verification endpoints.
//!
//! These types define the JSON request/response structure for the verification API.
//! They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::handlers::verification::{
    CompleteSessionResult, CreateAccessTokenResult, HandleProviderCallbackResult, KindSummary,
    RefreshSessionResult, SubmitArtifactResult, UserStatusResult,
};
use crate::domain::verification::{VerificationKind, VerificationSession, VerificationStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a liveness session.
#[derive(Debug, Clone, Deserialize)]
pub struct StartLivenessRequest {
    pub user_id: String,
    /// Free-form client context stored with the session.
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Request to submit a liveness selfie.
#[derive(Debug, Clone, Deserialize)]
pub struct LivenessCheckRequest {
    pub session_id: String,
    pub image_base64: String,
    #[serde(default)]
    pub check_type: Option<String>,
}

/// Request to complete a liveness session.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteLivenessRequest {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Request to start a KYC session.
#[derive(Debug, Clone, Deserialize)]
pub struct StartKycRequest {
    pub user_id: String,
}

/// Request to submit one side of an identity document.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentScanRequest {
    pub kyc_session_id: String,
    pub image_base64: String,
    /// Defaults to `PASSPORT`.
    #[serde(default)]
    pub doc_type: Option<String>,
    /// ISO alpha-3 country, defaults to `USA`.
    #[serde(default)]
    pub country: Option<String>,
}

/// Request to submit the KYC selfie.
#[derive(Debug, Clone, Deserialize)]
pub struct SelfieVerifyRequest {
    pub kyc_session_id: String,
    pub image_base64: String,
}

/// Request to complete a KYC session.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteKycRequest {
    pub kyc_session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Request for a provider SDK token.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenRequest {
    pub user_id: String,
    /// Defaults to `kyc`.
    #[serde(default)]
    pub kind: Option<VerificationKind>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Session as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub user_id: String,
    pub kind: VerificationKind,
    pub status: VerificationStatus,
    pub steps_completed: Vec<String>,
    /// ISO 8601.
    pub created_at: String,
    /// ISO 8601.
    pub updated_at: String,
}

impl From<&VerificationSession> for SessionResponse {
    fn from(session: &VerificationSession) -> Self {
        Self {
            session_id: session.session_id.to_string(),
            user_id: session.user_id.to_string(),
            kind: session.kind,
            status: session.status,
            steps_completed: session.steps_completed(),
            created_at: session.created_at.to_rfc3339(),
            updated_at: session.updated_at.to_rfc3339(),
        }
    }
}

/// Response for session start.
#[derive(Debug, Clone, Serialize)]
pub struct StartSessionResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    /// False when an already active session was returned.
    pub created: bool,
}

/// Response for an artifact submission.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactResponse {
    pub session_id: String,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub steps_completed: Vec<String>,
}

impl From<SubmitArtifactResult> for ArtifactResponse {
    fn from(result: SubmitArtifactResult) -> Self {
        Self {
            session_id: result.session.session_id.to_string(),
            status: result.session.status,
            steps_completed: result.session.steps_completed(),
            image_id: result.image_id,
        }
    }
}

/// Response for a provider poll.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_answer: Option<String>,
}

impl From<RefreshSessionResult> for SessionStatusResponse {
    fn from(result: RefreshSessionResult) -> Self {
        Self {
            session: SessionResponse::from(&result.session),
            review_status: result.review_status,
            review_answer: result.review_answer,
        }
    }
}

/// Response for session completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteResponse {
    pub session_id: String,
    pub status: VerificationStatus,
    pub is_final: bool,
    /// Whether the user passed; only meaningful when `is_final`.
    pub verified: bool,
    pub message: String,
}

impl From<CompleteSessionResult> for CompleteResponse {
    fn from(result: CompleteSessionResult) -> Self {
        let message = if result.is_final {
            format!("Verification {}", result.session.status)
        } else {
            "Verification still in review, retry later".to_string()
        };
        Self {
            session_id: result.session.session_id.to_string(),
            status: result.session.status,
            is_final: result.is_final,
            verified: result.session.status == VerificationStatus::Completed,
            message,
        }
    }
}

/// Latest session of one kind in a user summary.
#[derive(Debug, Clone, Serialize)]
pub struct KindStatusResponse {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_session: Option<SessionResponse>,
}

impl From<&KindSummary> for KindStatusResponse {
    fn from(summary: &KindSummary) -> Self {
        Self {
            completed: summary.completed,
            latest_session: summary.latest_session.as_ref().map(SessionResponse::from),
        }
    }
}

/// Response for the user summary.
#[derive(Debug, Clone, Serialize)]
pub struct UserStatusResponse {
    pub user_id: String,
    pub fully_verified: bool,
    pub liveness: KindStatusResponse,
    pub kyc: KindStatusResponse,
}

impl From<UserStatusResult> for UserStatusResponse {
    fn from(result: UserStatusResult) -> Self {
        Self {
            fully_verified: result.fully_verified(),
            user_id: result.user_id.to_string(),
            liveness: KindStatusResponse::from(&result.liveness),
            kyc: KindStatusResponse::from(&result.kyc),
        }
    }
}

/// Response for SDK token requests.
#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenResponse {
    pub token: String,
    pub user_id: String,
    pub level_name: String,
}

impl From<CreateAccessTokenResult> for AccessTokenResponse {
    fn from(result: CreateAccessTokenResult) -> Self {
        Self {
            token: result.token.token,
            user_id: result.token.user_id,
            level_name: result.level_name,
        }
    }
}

/// Acknowledgement for provider callbacks.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackResponse {
    pub status: &'static str,
    /// `applied`, `unchanged` or `ignored`.
    pub result: &'static str,
    pub session_id: String,
    pub session_status: VerificationStatus,
}

impl From<HandleProviderCallbackResult> for CallbackResponse {
    fn from(result: HandleProviderCallbackResult) -> Self {
        Self {
            status: "ok",
            result: result.disposition.as_str(),
            session_id: result.session.session_id.to_string(),
            session_status: result.session.status,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
