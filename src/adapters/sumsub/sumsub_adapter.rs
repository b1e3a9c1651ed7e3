//! Sumsub verification provider adapter.
//!
//! Implements the `VerificationProvider` trait against the Sumsub REST API.
//!
//! # Security
//!
//! - Every request is signed with HMAC-SHA256 over
//!   `timestamp || METHOD || path || body`
//! - Multipart bodies are encoded before signing so the signed bytes are the
//!   bytes sent
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = SumsubConfig::new(app_token, secret_key)
//!     .with_base_url("https://api.sumsub.com")
//!     .with_timeout(Duration::from_secs(30));
//! let adapter = SumsubAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::foundation::SessionId;
use crate::domain::verification::{Artifact, DecodedImage, RequestSigner};
use crate::ports::{
    AccessToken, Applicant, ApplicantReview, CreateApplicantRequest, ProviderError,
    ProviderErrorCode, UploadedArtifact, VerificationProvider,
};

use super::api_types::{
    encode_multipart, AccessTokenBody, CreateApplicantBody, FormPart, IdDocMetadata,
    SumsubAccessToken, SumsubApplicant,
};

/// Sandbox API host.
pub const DEFAULT_BASE_URL: &str = "https://api.sandbox.sumsub.com";

const APP_TOKEN_HEADER: &str = "X-App-Token";
const ACCESS_TS_HEADER: &str = "X-App-Access-Ts";
const ACCESS_SIG_HEADER: &str = "X-App-Access-Sig";
const IMAGE_ID_HEADER: &str = "X-Image-Id";

/// Sumsub API configuration.
#[derive(Clone)]
pub struct SumsubConfig {
    /// Application token sent with every request.
    app_token: SecretString,

    /// Secret used to sign requests.
    secret_key: SecretString,

    /// Base URL for the API (default: sandbox).
    base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl SumsubConfig {
    /// Create a new configuration pointing at the sandbox.
    pub fn new(app_token: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            app_token: SecretString::new(app_token.into()),
            secret_key: SecretString::new(secret_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for SumsubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SumsubConfig")
            .field("app_token", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sumsub provider adapter.
pub struct SumsubAdapter {
    config: SumsubConfig,
    signer: RequestSigner,
    http_client: reqwest::Client,
}

impl SumsubAdapter {
    /// Create a new adapter with the given configuration.
    pub fn new(config: SumsubConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            signer: RequestSigner::new(config.secret_key.clone()),
            config,
            http_client,
        })
    }

    /// Builds the authentication headers for one request.
    fn signed_headers(
        &self,
        method: &Method,
        path: &str,
        body: &[u8],
        timestamp: i64,
    ) -> Result<HeaderMap, ProviderError> {
        let signature = self
            .signer
            .sign(method.as_str(), path, timestamp, body)
            .map_err(|e| ProviderError::new(ProviderErrorCode::AuthenticationError, e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            APP_TOKEN_HEADER,
            HeaderValue::from_str(self.config.app_token.expose_secret())
                .map_err(|_| ProviderError::invalid_response("App token is not a valid header value"))?,
        );
        headers.insert(ACCESS_TS_HEADER, HeaderValue::from(timestamp));
        headers.insert(
            ACCESS_SIG_HEADER,
            HeaderValue::from_str(&signature)
                .map_err(|_| ProviderError::invalid_response("Signature is not a valid header value"))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Signs and sends a request, mapping transport and status failures.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<reqwest::Response, ProviderError> {
        let timestamp = chrono::Utc::now().timestamp();
        let mut headers = self.signed_headers(&method, path, &body, timestamp)?;
        if let Some(content_type) = content_type {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_str(&content_type)
                    .map_err(|_| ProviderError::invalid_response("Invalid content type"))?,
            );
        }

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!(method = %method, path = %path, body_len = body.len(), "Sumsub request");

        let mut request = self.http_client.request(method.clone(), &url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                error = %error_text,
                "Sumsub request failed"
            );
            return Err(ProviderError::from_status(
                status.as_u16(),
                format!("Sumsub API error: {}", error_text),
            ));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Vec<u8>,
    ) -> Result<(T, Value), ProviderError> {
        let content_type = (!body.is_empty()).then(|| "application/json".to_string());
        let response = self.send(method, path, body, content_type).await?;
        parse_json(response).await
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        tracing::warn!(error = %e, "Sumsub request timed out");
        ProviderError::timeout(e.to_string())
    } else {
        tracing::warn!(error = %e, "Sumsub request failed to send");
        ProviderError::network(e.to_string())
    }
}

async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<(T, Value), ProviderError> {
    let bytes = response.bytes().await.map_err(map_transport_error)?;
    let raw: Value = serde_json::from_slice(&bytes).map_err(|e| {
        ProviderError::invalid_response(format!("Failed to parse Sumsub response: {}", e))
    })?;
    let typed: T = serde_json::from_value(raw.clone()).map_err(|e| {
        ProviderError::invalid_response(format!("Unexpected Sumsub response: {}", e))
    })?;
    Ok((typed, raw))
}

/// The query is percent-encoded here so the signed path matches the wire.
fn applicant_path(level_name: &str) -> String {
    format!(
        "/resources/applicants?levelName={}",
        urlencoding::encode(level_name)
    )
}

fn upload_path(applicant_id: &SessionId, artifact: &Artifact) -> String {
    match artifact {
        Artifact::Selfie => format!("/resources/applicants/{}/info/selfie", applicant_id),
        Artifact::Document { .. } => format!("/resources/applicants/{}/info/idDoc", applicant_id),
    }
}

fn upload_parts<'a>(
    artifact: &'a Artifact,
    image: &'a DecodedImage,
) -> Result<Vec<FormPart<'a>>, ProviderError> {
    let mut parts = Vec::with_capacity(2);
    if let Artifact::Document { side, descriptor } = artifact {
        let metadata = IdDocMetadata {
            id_doc_type: &descriptor.doc_type,
            country: &descriptor.country,
            id_doc_sub_type: Some(side.provider_sub_type()),
        };
        let value = serde_json::to_string(&metadata)
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;
        parts.push(FormPart::Text {
            name: "metadata",
            value,
        });
    }
    parts.push(FormPart::File {
        name: "content",
        file_name: image.format.file_name(),
        content_type: image.format.mime_type(),
        bytes: &image.bytes,
    });
    Ok(parts)
}

fn to_json(value: &impl serde::Serialize) -> Result<Vec<u8>, ProviderError> {
    serde_json::to_vec(value).map_err(|e| ProviderError::invalid_response(e.to_string()))
}

#[async_trait]
impl VerificationProvider for SumsubAdapter {
    async fn create_applicant(
        &self,
        request: CreateApplicantRequest,
    ) -> Result<Applicant, ProviderError> {
        let path = applicant_path(&request.level_name);
        let body = to_json(&CreateApplicantBody {
            external_user_id: &request.external_user_id,
        })?;

        let (applicant, raw): (SumsubApplicant, Value) =
            self.send_json(Method::POST, &path, body).await?;

        if applicant.id.trim().is_empty() {
            return Err(ProviderError::invalid_response("Sumsub returned an empty applicant id"));
        }

        tracing::info!(
            applicant_id = %applicant.id,
            level_name = %request.level_name,
            "Sumsub applicant created"
        );

        Ok(Applicant {
            id: applicant.id,
            external_user_id: applicant
                .external_user_id
                .unwrap_or(request.external_user_id),
            level_name: request.level_name,
            raw,
        })
    }

    async fn upload_artifact(
        &self,
        applicant_id: &SessionId,
        artifact: &Artifact,
        image: &DecodedImage,
    ) -> Result<UploadedArtifact, ProviderError> {
        let path = upload_path(applicant_id, artifact);
        let boundary = format!("----biometric{}", Uuid::new_v4().simple());
        let body = encode_multipart(&boundary, &upload_parts(artifact, image)?);

        let response = self
            .send(
                Method::POST,
                &path,
                body,
                Some(format!("multipart/form-data; boundary={}", boundary)),
            )
            .await?;

        let image_id = response
            .headers()
            .get(IMAGE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        let raw = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        tracing::info!(
            applicant_id = %applicant_id,
            step = artifact.step_name(),
            image_id = image_id.as_deref().unwrap_or(""),
            "Sumsub artifact uploaded"
        );

        Ok(UploadedArtifact { image_id, raw })
    }

    async fn get_review(&self, applicant_id: &SessionId) -> Result<ApplicantReview, ProviderError> {
        let path = format!("/resources/applicants/{}", applicant_id);
        let (applicant, raw): (SumsubApplicant, Value) =
            self.send_json(Method::GET, &path, Vec::new()).await?;

        Ok(ApplicantReview {
            review_status: applicant.review_status(),
            review_answer: applicant.review_answer(),
            raw,
        })
    }

    async fn create_access_token(
        &self,
        external_user_id: &str,
        level_name: &str,
    ) -> Result<AccessToken, ProviderError> {
        let body = to_json(&AccessTokenBody {
            user_id: external_user_id,
            level_name,
        })?;

        let (token, _raw): (SumsubAccessToken, Value) = self
            .send_json(Method::POST, "/resources/accessTokens/sdk", body)
            .await?;

        Ok(AccessToken {
            token: token.token,
            user_id: token.user_id.unwrap_or_else(|| external_user_id.to_string()),
        })
    }
}
