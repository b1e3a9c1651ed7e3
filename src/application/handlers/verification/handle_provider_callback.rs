//! HandleProviderCallbackHandler - Applies review results pushed by the provider.
//!
//! Nothing in the payload is trusted until its digest has been verified over
//! the byte-exact body.

use std::sync::Arc;

use serde_json::{json, Map};

use crate::domain::verification::{
    DigestAlgorithm, ParsedCallback, SignatureVerifier, VerificationError, VerificationSession,
    VerificationStatus,
};
use crate::ports::SessionRepository;

use super::transitions::{SessionTransitions, TransitionOutcome};

/// Command carrying a raw provider callback.
#[derive(Debug, Clone)]
pub struct HandleProviderCallbackCommand {
    pub payload: Vec<u8>,
    /// Value of the digest header, if present.
    pub digest: Option<String>,
    /// Value of the digest algorithm header, if present.
    pub algorithm: Option<String>,
}

/// How a verified callback was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackDisposition {
    Applied,
    /// Session already had the requested status.
    Unchanged,
    /// Session is terminal with a different status.
    Ignored,
}

impl CallbackDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackDisposition::Applied => "applied",
            CallbackDisposition::Unchanged => "unchanged",
            CallbackDisposition::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HandleProviderCallbackResult {
    pub session: VerificationSession,
    pub requested_status: VerificationStatus,
    pub disposition: CallbackDisposition,
}

/// Handler for provider callbacks.
pub struct HandleProviderCallbackHandler {
    sessions: Arc<dyn SessionRepository>,
    transitions: SessionTransitions,
    verifier: SignatureVerifier,
}

impl HandleProviderCallbackHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        transitions: SessionTransitions,
        verifier: SignatureVerifier,
    ) -> Self {
        Self {
            sessions,
            transitions,
            verifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleProviderCallbackCommand,
    ) -> Result<HandleProviderCallbackResult, VerificationError> {
        // 1. Verify the digest
        self.verify(&cmd)?;

        // 2. Parse the payload
        let callback = ParsedCallback::parse(&cmd.payload)?;
        let target = callback.target_status();

        tracing::info!(
            applicant_id = %callback.applicant_id,
            review_status = %callback.review_status,
            review_answer = ?callback.review_answer,
            event_type = ?callback.event_type,
            "Provider callback received"
        );

        // 3. Locate the session
        let session = self.locate(&callback).await?;

        // 4. Apply the mapped status
        let mut patch = Map::new();
        patch.insert("last_callback".to_string(), callback.raw.clone());
        patch.insert("last_review_status".to_string(), json!(callback.review_status));
        if let Some(answer) = &callback.review_answer {
            patch.insert("last_review_answer".to_string(), json!(answer));
        }

        let outcome = self.transitions.transition(session, target, patch).await?;
        let disposition = match &outcome {
            TransitionOutcome::Applied { .. } => CallbackDisposition::Applied,
            TransitionOutcome::Unchanged { .. } => CallbackDisposition::Unchanged,
            TransitionOutcome::Ignored { .. } => CallbackDisposition::Ignored,
        };

        Ok(HandleProviderCallbackResult {
            session: outcome.into_session(),
            requested_status: target,
            disposition,
        })
    }

    fn verify(&self, cmd: &HandleProviderCallbackCommand) -> Result<(), VerificationError> {
        let result = DigestAlgorithm::from_header(cmd.algorithm.as_deref()).and_then(|alg| {
            self.verifier
                .verify_payload_digest(&cmd.payload, cmd.digest.as_deref().unwrap_or(""), alg)
        });

        if let Err(e) = result {
            tracing::warn!(
                reason = %e,
                payload_bytes = cmd.payload.len(),
                "Rejected provider callback"
            );
            return Err(e.into());
        }
        Ok(())
    }

    async fn locate(
        &self,
        callback: &ParsedCallback,
    ) -> Result<VerificationSession, VerificationError> {
        if let Some(session) = self.sessions.find_by_id(&callback.applicant_id).await? {
            return Ok(session);
        }

        if let Some(external_user_id) = &callback.external_user_id {
            if let Some(session) = self
                .sessions
                .find_by_external_user_id(external_user_id)
                .await?
            {
                return Ok(session);
            }
        }

        tracing::warn!(
            applicant_id = %callback.applicant_id,
            external_user_id = ?callback.external_user_id,
            "Callback matches no session"
        );
        Err(VerificationError::session_not_found(
            callback.applicant_id.as_str(),
        ))
    }
}
