//! Axum router configuration for verification endpoints.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::adapters::http::health::{health_router, webhook_health};
use crate::adapters::http::middleware::require_api_key;

use super::handlers::{
    check_liveness, complete_kyc, complete_liveness, create_access_token, kyc_status,
    liveness_result, provider_callback, scan_document_back, scan_document_front, start_kyc,
    start_liveness, user_status, verify_selfie, VerificationAppState,
};

/// Room for base64 expansion and the JSON envelope around an image.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the client API router.
///
/// # Routes (require `X-API-Key`)
///
/// ## Liveness
/// - `POST /liveness/start` - Start a liveness session
/// - `POST /liveness/check` - Submit the liveness selfie
/// - `POST /liveness/complete` - Complete a liveness session
/// - `GET /liveness/result/:session_id` - Poll the provider
/// - `GET /liveness/status/:user_id` - User summary
///
/// ## KYC
/// - `POST /kyc/start` - Start a KYC session
/// - `POST /document/scan-front` - Submit the document front
/// - `POST /document/scan-back` - Submit the document back
/// - `POST /selfie/verify` - Submit the KYC selfie
/// - `GET /kyc/status/:session_id` - Poll the provider
/// - `POST /kyc/complete` - Complete a KYC session
///
/// ## Other
/// - `GET /user/:user_id/status` - User summary
/// - `POST /sdk/access-token` - Provider SDK token
pub fn client_routes(state: VerificationAppState) -> Router<VerificationAppState> {
    Router::new()
        .route("/liveness/start", post(start_liveness))
        .route("/liveness/check", post(check_liveness))
        .route("/liveness/complete", post(complete_liveness))
        .route("/liveness/result/:session_id", get(liveness_result))
        .route("/liveness/status/:user_id", get(user_status))
        .route("/kyc/start", post(start_kyc))
        .route("/document/scan-front", post(scan_document_front))
        .route("/document/scan-back", post(scan_document_back))
        .route("/selfie/verify", post(verify_selfie))
        .route("/kyc/status/:session_id", get(kyc_status))
        .route("/kyc/complete", post(complete_kyc))
        .route("/user/:user_id/status", get(user_status))
        .route("/sdk/access-token", post(create_access_token))
        .layer(middleware::from_fn_with_state(
            state.api_key.clone(),
            require_api_key,
        ))
}

/// Create the provider callback router.
///
/// Separate from the client routes because callbacks carry no API key; they
/// are verified via payload digest.
///
/// # Routes
/// - `POST /sumsub` - Handle provider callbacks
/// - `GET /health` - Callback endpoint health
pub fn webhook_routes() -> Router<VerificationAppState> {
    Router::new()
        .route("/sumsub", post(provider_callback))
        .route("/health", get(webhook_health))
}

/// Create the complete application router with state applied.
pub fn verification_router(state: VerificationAppState) -> Router {
    let body_limit = state
        .max_image_bytes
        .saturating_mul(4)
        .saturating_div(3)
        .saturating_add(BODY_OVERHEAD_BYTES);

    let api = Router::new()
        .merge(client_routes(state.clone()))
        .nest("/webhook", webhook_routes());

    Router::new()
        .merge(health_router())
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}
