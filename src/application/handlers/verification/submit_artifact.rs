//! SubmitArtifactHandler - Command handler for selfie and document uploads.

use std::sync::Arc;

use serde_json::{json, Map};

use crate::domain::foundation::SessionId;
use crate::domain::verification::{
    decode_image, Artifact, VerificationError, VerificationKind, VerificationSession,
};
use crate::ports::{SessionRepository, VerificationProvider};

use super::transitions::SessionTransitions;

/// Command to submit one artifact.
#[derive(Debug, Clone)]
pub struct SubmitArtifactCommand {
    pub session_id: SessionId,
    /// When set, sessions of another kind are reported as not found.
    pub kind: Option<VerificationKind>,
    pub artifact: Artifact,
    /// Base64 image, optionally as a `data:` URL.
    pub image_base64: String,
}

#[derive(Debug, Clone)]
pub struct SubmitArtifactResult {
    pub session: VerificationSession,
    pub image_id: Option<String>,
}

/// Handler for artifact submissions.
///
/// Decodes the image, forwards it to the provider and records the upload.
/// A failed upload leaves the session untouched.
pub struct SubmitArtifactHandler {
    sessions: Arc<dyn SessionRepository>,
    provider: Arc<dyn VerificationProvider>,
    transitions: SessionTransitions,
    max_image_bytes: usize,
}

impl SubmitArtifactHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        provider: Arc<dyn VerificationProvider>,
        transitions: SessionTransitions,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            sessions,
            provider,
            transitions,
            max_image_bytes,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitArtifactCommand,
    ) -> Result<SubmitArtifactResult, VerificationError> {
        // 1. Validate the image before touching anything else
        let image = decode_image("image_base64", &cmd.image_base64, self.max_image_bytes)?;

        // 2. Load and check the session
        let session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .filter(|s| cmd.kind.map_or(true, |kind| s.kind == kind))
            .ok_or_else(|| VerificationError::session_not_found(cmd.session_id.as_str()))?;

        if !cmd.artifact.allowed_for(session.kind) {
            return Err(VerificationError::validation(
                "session_id",
                format!(
                    "{} cannot be submitted to a {} session",
                    cmd.artifact.step_name(),
                    session.kind
                ),
            ));
        }
        session.status_after_artifact()?;

        // 3. Upload
        let uploaded = self
            .provider
            .upload_artifact(&session.session_id, &cmd.artifact, &image)
            .await?;

        // 4. Record the upload
        let mut patch = Map::new();
        if let Some(image_id) = &uploaded.image_id {
            patch.insert(cmd.artifact.image_id_key(), json!(image_id));
        }
        if let Artifact::Document { descriptor, .. } = &cmd.artifact {
            patch.insert("document_type".to_string(), json!(descriptor.doc_type));
            patch.insert("document_country".to_string(), json!(descriptor.country));
        }

        let session = self
            .transitions
            .record_artifact(session, patch, cmd.artifact.step_name())
            .await?;

        Ok(SubmitArtifactResult {
            session,
            image_id: uploaded.image_id,
        })
    }
}
