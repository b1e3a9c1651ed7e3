//! Mock verification provider for testing.
//!
//! Provides a configurable implementation of `VerificationProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured review results per applicant
//! - Error injection, globally or per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::domain::foundation::SessionId;
use crate::domain::verification::{Artifact, DecodedImage};
use crate::ports::{
    AccessToken, Applicant, ApplicantReview, CreateApplicantRequest, ProviderError,
    UploadedArtifact, VerificationProvider,
};

/// Mock verification provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockVerificationProvider::new();
/// mock.set_review("applicant-1", "completed", Some("GREEN"));
/// mock.set_method_error("upload_artifact", ProviderError::timeout("slow"));
/// ```
#[derive(Default, Clone)]
pub struct MockVerificationProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Review to report per applicant id.
    reviews: HashMap<String, (String, Option<String>)>,

    /// Applicant id to hand out on the next `create_applicant`.
    next_applicant_id: Option<String>,

    /// Counter for generated applicant and image ids.
    counter: u64,

    /// Error to return on next call.
    next_error: Option<ProviderError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, ProviderError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockVerificationProvider {
    /// Create a new mock provider with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Use this id for the next created applicant.
    pub fn set_next_applicant_id(&self, id: impl Into<String>) {
        self.inner.lock().unwrap().next_applicant_id = Some(id.into());
    }

    /// Set the review reported for an applicant.
    pub fn set_review(&self, applicant_id: &str, status: &str, answer: Option<&str>) {
        self.inner.lock().unwrap().reviews.insert(
            applicant_id.to_string(),
            (status.to_string(), answer.map(str::to_string)),
        );
    }

    /// Fail the next call, whichever method it is.
    pub fn set_error(&self, error: ProviderError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Fail every call to `method` until cleared.
    pub fn set_method_error(&self, method: &str, error: ProviderError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertion Helpers
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    fn record(&self, method: &str, args: Vec<String>) -> Result<(), ProviderError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });

        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        if let Some(err) = state.method_errors.get(method) {
            return Err(err.clone());
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.inner.lock().unwrap();
        state.counter += 1;
        format!("{}-{}", prefix, state.counter)
    }
}

#[async_trait]
impl VerificationProvider for MockVerificationProvider {
    async fn create_applicant(
        &self,
        request: CreateApplicantRequest,
    ) -> Result<Applicant, ProviderError> {
        self.record(
            "create_applicant",
            vec![request.external_user_id.clone(), request.level_name.clone()],
        )?;

        let preset = self.inner.lock().unwrap().next_applicant_id.take();
        let id = match preset {
            Some(id) => id,
            None => self.next_id("applicant"),
        };

        Ok(Applicant {
            raw: json!({"id": id, "externalUserId": request.external_user_id}),
            id,
            external_user_id: request.external_user_id,
            level_name: request.level_name,
        })
    }

    async fn upload_artifact(
        &self,
        applicant_id: &SessionId,
        artifact: &Artifact,
        image: &DecodedImage,
    ) -> Result<UploadedArtifact, ProviderError> {
        self.record(
            "upload_artifact",
            vec![
                applicant_id.to_string(),
                artifact.step_name().to_string(),
                image.bytes.len().to_string(),
            ],
        )?;

        let image_id = self.next_id("image");
        Ok(UploadedArtifact {
            raw: json!({"imageId": image_id}),
            image_id: Some(image_id),
        })
    }

    async fn get_review(&self, applicant_id: &SessionId) -> Result<ApplicantReview, ProviderError> {
        self.record("get_review", vec![applicant_id.to_string()])?;

        let (review_status, review_answer) = self
            .inner
            .lock()
            .unwrap()
            .reviews
            .get(applicant_id.as_str())
            .cloned()
            .unwrap_or_else(|| ("init".to_string(), None));

        Ok(ApplicantReview {
            raw: json!({
                "id": applicant_id.as_str(),
                "review": {
                    "reviewStatus": review_status,
                    "reviewResult": {"reviewAnswer": review_answer},
                },
            }),
            review_status,
            review_answer,
        })
    }

    async fn create_access_token(
        &self,
        external_user_id: &str,
        level_name: &str,
    ) -> Result<AccessToken, ProviderError> {
        self.record(
            "create_access_token",
            vec![external_user_id.to_string(), level_name.to_string()],
        )?;

        Ok(AccessToken {
            token: format!("_act-sbx-{}", self.next_id("token")),
            user_id: external_user_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateApplicantRequest {
        CreateApplicantRequest {
            external_user_id: "user-1.abc".to_string(),
            level_name: "liveness-level".to_string(),
        }
    }

    #[tokio::test]
    async fn create_applicant_uses_preset_id() {
        let mock = MockVerificationProvider::new();
        mock.set_next_applicant_id("u1");

        let applicant = mock.create_applicant(request()).await.unwrap();
        assert_eq!(applicant.id, "u1");
        assert_eq!(mock.call_count("create_applicant"), 1);
    }

    #[tokio::test]
    async fn get_review_defaults_to_init() {
        let mock = MockVerificationProvider::new();
        let review = mock.get_review(&SessionId::new("x").unwrap()).await.unwrap();
        assert_eq!(review.review_status, "init");
    }

    #[tokio::test]
    async fn next_error_is_consumed_once() {
        let mock = MockVerificationProvider::new();
        mock.set_error(ProviderError::timeout("slow"));

        assert!(mock.create_applicant(request()).await.is_err());
        assert!(mock.create_applicant(request()).await.is_ok());
    }

    #[tokio::test]
    async fn method_error_persists_until_cleared() {
        let mock = MockVerificationProvider::new();
        mock.set_method_error("get_review", ProviderError::network("down"));
        let id = SessionId::new("x").unwrap();

        assert!(mock.get_review(&id).await.is_err());
        assert!(mock.get_review(&id).await.is_err());
        mock.clear_errors();
        assert!(mock.get_review(&id).await.is_ok());
    }
}
