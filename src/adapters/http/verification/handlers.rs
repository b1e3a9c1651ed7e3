//! HTTP handlers for verification endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;

use crate::adapters::http::middleware::ApiKeyState;
use crate::application::handlers::verification::{
    CompleteSessionCommand, CompleteSessionHandler, CreateAccessTokenCommand,
    CreateAccessTokenHandler, GetUserStatusHandler, GetUserStatusQuery,
    HandleProviderCallbackCommand, HandleProviderCallbackHandler, RefreshSessionCommand,
    RefreshSessionHandler, SessionTransitions, StartSessionCommand, StartSessionHandler,
    SubmitArtifactCommand, SubmitArtifactHandler, VerificationLevels,
};
use crate::domain::foundation::{SessionId, UserId};
use crate::domain::verification::{
    Artifact, DocumentDescriptor, DocumentSide, SignatureVerifier, VerificationError,
    VerificationKind, PAYLOAD_DIGEST_ALG_HEADER, PAYLOAD_DIGEST_HEADER,
};
use crate::ports::{SessionRepository, UserRepository, VerificationProvider};

use super::dto::{
    AccessTokenRequest, AccessTokenResponse, ArtifactResponse, CallbackResponse,
    CompleteKycRequest, CompleteLivenessRequest, CompleteResponse, DocumentScanRequest,
    ErrorResponse, LivenessCheckRequest, SelfieVerifyRequest, SessionResponse,
    SessionStatusResponse, StartKycRequest, StartLivenessRequest, StartSessionResponse,
    UserStatusResponse,
};

/// Seconds clients should wait before retrying after a provider failure.
pub const RETRY_AFTER_SECS: u64 = 5;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every dependency is Arc-wrapped or cheap to clone.
#[derive(Clone)]
pub struct VerificationAppState {
    pub sessions: Arc<dyn SessionRepository>,
    pub users: Arc<dyn UserRepository>,
    pub provider: Arc<dyn VerificationProvider>,
    pub levels: VerificationLevels,
    pub callback_verifier: SignatureVerifier,
    pub api_key: ApiKeyState,
    pub max_image_bytes: usize,
}

impl VerificationAppState {
    fn transitions(&self) -> SessionTransitions {
        SessionTransitions::new(self.sessions.clone(), self.users.clone())
    }

    pub fn start_session_handler(&self) -> StartSessionHandler {
        StartSessionHandler::new(
            self.sessions.clone(),
            self.provider.clone(),
            self.levels.clone(),
        )
    }

    pub fn submit_artifact_handler(&self) -> SubmitArtifactHandler {
        SubmitArtifactHandler::new(
            self.sessions.clone(),
            self.provider.clone(),
            self.transitions(),
            self.max_image_bytes,
        )
    }

    pub fn refresh_session_handler(&self) -> RefreshSessionHandler {
        RefreshSessionHandler::new(
            self.sessions.clone(),
            self.provider.clone(),
            self.transitions(),
        )
    }

    pub fn complete_session_handler(&self) -> CompleteSessionHandler {
        CompleteSessionHandler::new(self.sessions.clone(), self.refresh_session_handler())
    }

    pub fn callback_handler(&self) -> HandleProviderCallbackHandler {
        HandleProviderCallbackHandler::new(
            self.sessions.clone(),
            self.transitions(),
            self.callback_verifier.clone(),
        )
    }

    pub fn user_status_handler(&self) -> GetUserStatusHandler {
        GetUserStatusHandler::new(self.sessions.clone(), self.users.clone())
    }

    pub fn access_token_handler(&self) -> CreateAccessTokenHandler {
        CreateAccessTokenHandler::new(
            self.sessions.clone(),
            self.provider.clone(),
            self.levels.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Session Lifecycle (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/v1/liveness/start - Start a liveness session
pub async fn start_liveness(
    State(state): State<VerificationAppState>,
    payload: Result<Json<StartLivenessRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let request = body(payload)?;
    let cmd = StartSessionCommand {
        user_id: UserId::new(request.user_id)?,
        kind: VerificationKind::Liveness,
        client_metadata: request.metadata,
    };
    start(state, cmd).await
}

/// POST /api/v1/kyc/start - Start a KYC session
pub async fn start_kyc(
    State(state): State<VerificationAppState>,
    payload: Result<Json<StartKycRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let request = body(payload)?;
    let cmd = StartSessionCommand {
        user_id: UserId::new(request.user_id)?,
        kind: VerificationKind::Kyc,
        client_metadata: None,
    };
    start(state, cmd).await
}

async fn start(
    state: VerificationAppState,
    cmd: StartSessionCommand,
) -> Result<Response, VerificationApiError> {
    let result = state.start_session_handler().handle(cmd).await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let response = StartSessionResponse {
        session: SessionResponse::from(&result.session),
        created: result.created,
    };
    Ok((status, Json(response)).into_response())
}

/// POST /api/v1/liveness/complete - Complete a liveness session
pub async fn complete_liveness(
    State(state): State<VerificationAppState>,
    payload: Result<Json<CompleteLivenessRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let request = body(payload)?;
    let cmd = CompleteSessionCommand {
        session_id: SessionId::new(request.session_id)?,
        kind: VerificationKind::Liveness,
        user_id: request.user_id.map(UserId::new).transpose()?,
    };

    let result = state.complete_session_handler().handle(cmd).await?;
    Ok(Json(CompleteResponse::from(result)))
}

/// POST /api/v1/kyc/complete - Complete a KYC session
pub async fn complete_kyc(
    State(state): State<VerificationAppState>,
    payload: Result<Json<CompleteKycRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let request = body(payload)?;
    let cmd = CompleteSessionCommand {
        session_id: SessionId::new(request.kyc_session_id)?,
        kind: VerificationKind::Kyc,
        user_id: request.user_id.map(UserId::new).transpose()?,
    };

    let result = state.complete_session_handler().handle(cmd).await?;
    Ok(Json(CompleteResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Artifacts (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/v1/liveness/check - Submit the liveness selfie
pub async fn check_liveness(
    State(state): State<VerificationAppState>,
    payload: Result<Json<LivenessCheckRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let request = body(payload)?;
    if let Some(check_type) = &request.check_type {
        tracing::debug!(check_type = %check_type, "Liveness check type requested");
    }

    let cmd = SubmitArtifactCommand {
        session_id: SessionId::new(request.session_id)?,
        kind: Some(VerificationKind::Liveness),
        artifact: Artifact::Selfie,
        image_base64: request.image_base64,
    };
    submit(state, cmd).await
}

/// POST /api/v1/document/scan-front - Submit the document front
pub async fn scan_document_front(
    State(state): State<VerificationAppState>,
    payload: Result<Json<DocumentScanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VerificationApiError> {
    scan_document(state, DocumentSide::Front, body(payload)?).await
}

/// POST /api/v1/document/scan-back - Submit the document back
pub async fn scan_document_back(
    State(state): State<VerificationAppState>,
    payload: Result<Json<DocumentScanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VerificationApiError> {
    scan_document(state, DocumentSide::Back, body(payload)?).await
}

async fn scan_document(
    state: VerificationAppState,
    side: DocumentSide,
    request: DocumentScanRequest,
) -> Result<Response, VerificationApiError> {
    let descriptor =
        DocumentDescriptor::new(request.doc_type.as_deref(), request.country.as_deref())?;

    // No kind filter: a liveness session gets a 400, not a 404.
    let cmd = SubmitArtifactCommand {
        session_id: SessionId::new(request.kyc_session_id)?,
        kind: None,
        artifact: Artifact::Document { side, descriptor },
        image_base64: request.image_base64,
    };
    submit(state, cmd).await
}

/// POST /api/v1/selfie/verify - Submit the KYC selfie
pub async fn verify_selfie(
    State(state): State<VerificationAppState>,
    payload: Result<Json<SelfieVerifyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let request = body(payload)?;
    let cmd = SubmitArtifactCommand {
        session_id: SessionId::new(request.kyc_session_id)?,
        kind: Some(VerificationKind::Kyc),
        artifact: Artifact::Selfie,
        image_base64: request.image_base64,
    };
    submit(state, cmd).await
}

async fn submit(
    state: VerificationAppState,
    cmd: SubmitArtifactCommand,
) -> Result<Response, VerificationApiError> {
    let result = state.submit_artifact_handler().handle(cmd).await?;
    Ok(Json(ArtifactResponse::from(result)).into_response())
}

// ════════════════════════════════════════════════════════════════════════════════
// Queries (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/v1/liveness/result/:session_id - Poll a liveness session
pub async fn liveness_result(
    State(state): State<VerificationAppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, VerificationApiError> {
    refresh(state, session_id, VerificationKind::Liveness).await
}

/// GET /api/v1/kyc/status/:session_id - Poll a KYC session
pub async fn kyc_status(
    State(state): State<VerificationAppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, VerificationApiError> {
    refresh(state, session_id, VerificationKind::Kyc).await
}

async fn refresh(
    state: VerificationAppState,
    session_id: String,
    kind: VerificationKind,
) -> Result<Response, VerificationApiError> {
    let cmd = RefreshSessionCommand {
        session_id: SessionId::new(session_id)?,
        kind: Some(kind),
    };
    let result = state.refresh_session_handler().handle(cmd).await?;
    Ok(Json(SessionStatusResponse::from(result)).into_response())
}

/// GET /api/v1/user/:user_id/status and /api/v1/liveness/status/:user_id
pub async fn user_status(
    State(state): State<VerificationAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let query = GetUserStatusQuery {
        user_id: UserId::new(user_id)?,
    };
    let result = state.user_status_handler().handle(query).await?;
    Ok(Json(UserStatusResponse::from(result)))
}

/// POST /api/v1/sdk/access-token - Issue a provider SDK token
pub async fn create_access_token(
    State(state): State<VerificationAppState>,
    payload: Result<Json<AccessTokenRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VerificationApiError> {
    let request = body(payload)?;
    let cmd = CreateAccessTokenCommand {
        user_id: UserId::new(request.user_id)?,
        kind: request.kind.unwrap_or(VerificationKind::Kyc),
    };
    let result = state.access_token_handler().handle(cmd).await?;
    Ok(Json(AccessTokenResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Provider Callback
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/v1/webhook/sumsub - Handle provider review callbacks
///
/// Takes the raw body: the digest covers the exact bytes received.
pub async fn provider_callback(
    State(state): State<VerificationAppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<impl IntoResponse, VerificationApiError> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let cmd = HandleProviderCallbackCommand {
        payload: payload.to_vec(),
        digest: header_value(PAYLOAD_DIGEST_HEADER),
        algorithm: header_value(PAYLOAD_DIGEST_ALG_HEADER),
    };

    let result = state.callback_handler().handle(cmd).await?;
    Ok(Json(CallbackResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

fn body<T: DeserializeOwned>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, VerificationApiError> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| VerificationError::validation("body", rejection.body_text()).into())
}

/// API error type that converts verification errors to HTTP responses.
#[derive(Debug)]
pub struct VerificationApiError(VerificationError);

impl From<VerificationError> for VerificationApiError {
    fn from(err: VerificationError) -> Self {
        Self(err)
    }
}

impl From<crate::domain::foundation::ValidationError> for VerificationApiError {
    fn from(err: crate::domain::foundation::ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for VerificationApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            VerificationError::Authentication(_) => StatusCode::UNAUTHORIZED,
            VerificationError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            VerificationError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            VerificationError::InvalidState { .. } => StatusCode::CONFLICT,
            VerificationError::Upstream(_) => StatusCode::BAD_GATEWAY,
            VerificationError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            VerificationError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self.0 {
            VerificationError::Infrastructure(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                "Internal server error".to_string()
            }
            VerificationError::Upstream(_) | VerificationError::UpstreamTimeout(_) => {
                tracing::warn!(error = %self.0, "Verification provider call failed");
                self.0.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse::new(self.0.code().to_string(), message);
        let mut response = (status, Json(body)).into_response();
        if self.0.is_retryable() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}
