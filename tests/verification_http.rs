//! End-to-end tests for the verification HTTP API.
//!
//! The full router runs against in-memory repositories and the mock
//! provider, so these cover routing, authentication, error mapping and the
//! session lifecycle together.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use biometric_gateway::adapters::http::middleware::{ApiKeyState, API_KEY_HEADER};
use biometric_gateway::adapters::http::{verification_router, VerificationAppState};
use biometric_gateway::adapters::memory::{InMemorySessionRepository, InMemoryUserRepository};
use biometric_gateway::adapters::sumsub::MockVerificationProvider;
use biometric_gateway::application::handlers::verification::VerificationLevels;
use biometric_gateway::domain::foundation::{SessionId, Timestamp, UserId};
use biometric_gateway::domain::verification::{
    payload_digest, DigestAlgorithm, SignatureVerifier, VerificationKind, VerificationSession,
    VerificationStatus, PAYLOAD_DIGEST_HEADER,
};
use biometric_gateway::ports::{ProviderError, SessionRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

const API_KEY: &str = "test-api-key-0123456789";
const WEBHOOK_SECRET: &str = "webhook-secret";

/// Base64 of a JPEG header, enough for the decoder.
const JPEG_B64: &str = "/9j/4AAQSkZJRgABAQAAAQABAAD/2wBDAA==";

struct TestApp {
    router: Router,
    sessions: InMemorySessionRepository,
    provider: MockVerificationProvider,
}

impl TestApp {
    fn new() -> Self {
        let sessions = InMemorySessionRepository::new();
        let provider = MockVerificationProvider::new();
        let router = verification_router(VerificationAppState {
            sessions: Arc::new(sessions.clone()),
            users: Arc::new(InMemoryUserRepository::new()),
            provider: Arc::new(provider.clone()),
            levels: VerificationLevels::new("liveness-only", "basic-kyc-level"),
            callback_verifier: SignatureVerifier::new(SecretString::new(
                WEBHOOK_SECRET.to_string(),
            )),
            api_key: ApiKeyState::new(SecretString::new(API_KEY.to_string())),
            max_image_bytes: 10 * 1024 * 1024,
        });
        Self {
            router,
            sessions,
            provider,
        }
    }

    async fn with_pending_session(id: &str) -> Self {
        let app = Self::new();
        let mut session = VerificationSession::start(
            SessionId::new(id).unwrap(),
            UserId::new("user-1").unwrap(),
            "user-1.ext",
            VerificationKind::Liveness,
            "liveness-only",
            Timestamp::now(),
        );
        session.status = VerificationStatus::Pending;
        app.sessions.insert(session).await;
        app
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header(API_KEY_HEADER, API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, axum::http::HeaderMap, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(API_KEY_HEADER, API_KEY)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn callback(&self, body: &str, digest: Option<String>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/webhook/sumsub")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(digest) = digest {
            builder = builder.header(PAYLOAD_DIGEST_HEADER, digest);
        }
        let (status, _, json) = self
            .send(builder.body(Body::from(body.to_string())).unwrap())
            .await;
        (status, json)
    }

    async fn stored(&self, id: &str) -> VerificationSession {
        self.sessions
            .find_by_id(&SessionId::new(id).unwrap())
            .await
            .unwrap()
            .unwrap()
    }
}

fn sign(body: &str) -> String {
    payload_digest(
        &SecretString::new(WEBHOOK_SECRET.to_string()),
        body.as_bytes(),
        DigestAlgorithm::HmacSha256Hex,
    )
    .unwrap()
}

const COMPLETED_CALLBACK: &str = r#"{"applicantId":"u1","reviewStatus":"completed"}"#;

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_healthy_without_key() {
    let app = TestApp::new();
    let (status, _, body) = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

// =============================================================================
// Provider Callback
// =============================================================================

#[tokio::test]
async fn signed_callback_completes_pending_session() {
    let app = TestApp::with_pending_session("u1").await;

    let (status, body) = app
        .callback(COMPLETED_CALLBACK, Some(sign(COMPLETED_CALLBACK)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["result"], "applied");
    assert_eq!(app.stored("u1").await.status, VerificationStatus::Completed);

    let (_, _, summary) = app.get("/api/v1/user/user-1/status").await;
    assert_eq!(summary["liveness"]["completed"], true);
    assert_eq!(summary["fully_verified"], false);
}

#[tokio::test]
async fn callback_with_wrong_digest_is_unauthorized() {
    let app = TestApp::with_pending_session("u1").await;

    let (status, body) = app
        .callback(COMPLETED_CALLBACK, Some("ab".repeat(32)))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error_code"].is_string());
    assert_eq!(app.stored("u1").await.status, VerificationStatus::Pending);
}

#[tokio::test]
async fn callback_without_digest_is_unauthorized() {
    let app = TestApp::with_pending_session("u1").await;

    let (status, _) = app.callback(COMPLETED_CALLBACK, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.stored("u1").await.status, VerificationStatus::Pending);
}

#[tokio::test]
async fn signed_but_malformed_callback_is_bad_request() {
    let app = TestApp::with_pending_session("u1").await;
    let body = r#"{"reviewStatus":"completed"}"#;

    let (status, _) = app.callback(body, Some(sign(body))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replayed_callback_changes_nothing() {
    let app = TestApp::with_pending_session("u1").await;
    app.callback(COMPLETED_CALLBACK, Some(sign(COMPLETED_CALLBACK)))
        .await;
    let first = app.stored("u1").await;

    let (status, body) = app
        .callback(COMPLETED_CALLBACK, Some(sign(COMPLETED_CALLBACK)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "unchanged");
    assert_eq!(app.stored("u1").await, first);
}

#[tokio::test]
async fn callback_for_unknown_applicant_is_not_found() {
    let app = TestApp::new();
    let body = r#"{"applicantId":"nobody","reviewStatus":"completed"}"#;

    let (status, _) = app.callback(body, Some(sign(body))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Authentication and Errors
// =============================================================================

#[tokio::test]
async fn client_route_without_key_is_unauthorized() {
    let app = TestApp::new();
    let (status, _, body) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/v1/liveness/start")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"user_id": "alice"}).to_string()))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "AUTHENTICATION_FAILED");
    assert_eq!(app.provider.call_count("create_applicant"), 0);
}

#[tokio::test]
async fn polling_unknown_session_is_not_found() {
    let app = TestApp::new();
    let (status, _, _) = app.get("/api/v1/kyc/status/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_json_body_is_bad_request() {
    let app = TestApp::new();
    let (status, _, _) = app
        .post("/api/v1/kyc/start", json!({"unexpected": true}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_timeout_is_gateway_timeout_with_retry_after() {
    let app = TestApp::new();
    app.provider
        .set_method_error("create_applicant", ProviderError::timeout("no answer"));

    let (status, headers, _) = app
        .post("/api/v1/kyc/start", json!({"user_id": "alice"}))
        .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "5");
    assert!(app.sessions.is_empty().await);
}

#[tokio::test]
async fn provider_failure_is_bad_gateway() {
    let app = TestApp::with_pending_session("u1").await;
    app.provider
        .set_method_error("get_review", ProviderError::from_status(503, "down"));

    let (status, headers, _) = app.get("/api/v1/liveness/result/u1").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(headers.get(header::RETRY_AFTER).is_some());
    assert_eq!(app.stored("u1").await.status, VerificationStatus::Pending);
}

// =============================================================================
// Session Lifecycle
// =============================================================================

#[tokio::test]
async fn liveness_flow_start_check_complete() {
    let app = TestApp::new();

    let (status, _, started) = app
        .post(
            "/api/v1/liveness/start",
            json!({"user_id": "alice", "metadata": {"device": "ios"}}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(started["status"], "initiated");
    assert_eq!(started["created"], true);
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let (status, _, checked) = app
        .post(
            "/api/v1/liveness/check",
            json!({"session_id": session_id, "image_base64": JPEG_B64}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checked["status"], "pending");
    assert_eq!(checked["steps_completed"].as_array().unwrap().len(), 1);

    // Still in review
    let (status, _, pending) = app
        .post(
            "/api/v1/liveness/complete",
            json!({"session_id": session_id, "is_live": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["is_final"], false);
    assert_eq!(pending["verified"], false);

    app.provider
        .set_review(&session_id, "completed", Some("GREEN"));
    let (_, _, done) = app
        .post("/api/v1/liveness/complete", json!({"session_id": session_id}))
        .await;
    assert_eq!(done["is_final"], true);
    assert_eq!(done["verified"], true);
    assert_eq!(done["status"], "completed");
}

#[tokio::test]
async fn starting_twice_returns_active_session() {
    let app = TestApp::new();

    let (first_status, _, first) = app
        .post("/api/v1/kyc/start", json!({"user_id": "bob"}))
        .await;
    let (second_status, _, second) = app
        .post("/api/v1/kyc/start", json!({"user_id": "bob"}))
        .await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(second["created"], false);
    assert_eq!(first["session_id"], second["session_id"]);
    assert_eq!(app.provider.call_count("create_applicant"), 1);
}

#[tokio::test]
async fn kyc_flow_rejected_by_provider() {
    let app = TestApp::new();
    let (_, _, started) = app
        .post("/api/v1/kyc/start", json!({"user_id": "carol"}))
        .await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    for uri in ["/api/v1/document/scan-front", "/api/v1/document/scan-back"] {
        let (status, _, _) = app
            .post(
                uri,
                json!({
                    "kyc_session_id": session_id,
                    "image_base64": JPEG_B64,
                    "doc_type": "ID_CARD",
                    "country": "DEU",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, _, selfie) = app
        .post(
            "/api/v1/selfie/verify",
            json!({"kyc_session_id": session_id, "image_base64": JPEG_B64}),
        )
        .await;
    assert_eq!(selfie["steps_completed"].as_array().unwrap().len(), 3);
    assert_eq!(app.provider.call_count("upload_artifact"), 3);

    app.provider
        .set_review(&session_id, "completed", Some("RED"));
    let (_, _, polled) = app
        .get(&format!("/api/v1/kyc/status/{}", session_id))
        .await;
    assert_eq!(polled["status"], "rejected");
    assert_eq!(polled["review_answer"], "RED");

    // Terminal sessions refuse new artifacts
    let (status, _, _) = app
        .post(
            "/api/v1/selfie/verify",
            json!({"kyc_session_id": session_id, "image_base64": JPEG_B64}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn document_on_liveness_session_is_bad_request() {
    let app = TestApp::new();
    let (_, _, started) = app
        .post("/api/v1/liveness/start", json!({"user_id": "dave"}))
        .await;

    let (status, _, _) = app
        .post(
            "/api/v1/document/scan-front",
            json!({"kyc_session_id": started["session_id"], "image_base64": JPEG_B64}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.call_count("upload_artifact"), 0);
}

#[tokio::test]
async fn access_token_defaults_to_kyc_level() {
    let app = TestApp::new();

    let (status, _, body) = app
        .post("/api/v1/sdk/access-token", json!({"user_id": "erin"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level_name"], "basic-kyc-level");
    assert_eq!(body["user_id"], "erin");
    assert!(body["token"].as_str().unwrap().starts_with("_act-"));
}
