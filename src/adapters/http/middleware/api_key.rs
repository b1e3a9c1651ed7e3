//! API key middleware for client routes.
//!
//! Requests must carry the configured key in `X-API-Key`. The provider
//! callback route is mounted outside this layer; it is authenticated by its
//! payload digest instead.
//!
//! # Example
//!
//! ```ignore
//! let guard = ApiKeyState::new(SecretString::new("key".into()));
//! let app = Router::new()
//!     .route("/api/v1/kyc/start", post(start_kyc))
//!     .layer(middleware::from_fn_with_state(guard, require_api_key));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::adapters::http::verification::ErrorResponse;
use crate::domain::foundation::ErrorCode;

/// Header carrying the client API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Middleware state holding the expected key.
#[derive(Clone)]
pub struct ApiKeyState {
    key: Arc<SecretString>,
}

impl ApiKeyState {
    pub fn new(key: SecretString) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Constant-time comparison against the configured key. An empty
    /// configured key accepts nothing.
    pub fn accepts(&self, presented: &str) -> bool {
        let expected = self.key.expose_secret().as_bytes();
        if expected.is_empty() {
            return false;
        }
        expected.ct_eq(presented.as_bytes()).into()
    }
}

impl std::fmt::Debug for ApiKeyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyState").field("key", &"[REDACTED]").finish()
    }
}

/// Rejects requests without a valid `X-API-Key` header with 401.
pub async fn require_api_key(
    State(state): State<ApiKeyState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if state.accepts(presented) {
        return next.run(request).await;
    }

    tracing::warn!(
        path = %request.uri().path(),
        key_present = !presented.is_empty(),
        "Rejected request with invalid API key"
    );
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(
            ErrorCode::AuthenticationFailed.to_string(),
            "Missing or invalid API key",
        )),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_exact_key() {
        let state = ApiKeyState::new(SecretString::new("k-123".to_string()));
        assert!(state.accepts("k-123"));
        assert!(!state.accepts("k-124"));
        assert!(!state.accepts("k-12"));
        assert!(!state.accepts(""));
    }

    #[test]
    fn empty_configured_key_accepts_nothing() {
        let state = ApiKeyState::new(SecretString::new(String::new()));
        assert!(!state.accepts(""));
    }

    #[test]
    fn debug_redacts_key() {
        let state = ApiKeyState::new(SecretString::new("k-123".to_string()));
        assert!(!format!("{:?}", state).contains("k-123"));
    }
}
