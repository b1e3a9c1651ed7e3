//! RefreshSessionHandler - Pulls the provider's review state into a session.

use std::sync::Arc;

use serde_json::{json, Map};

use crate::domain::foundation::SessionId;
use crate::domain::verification::{
    resolve_status, VerificationError, VerificationKind, VerificationSession,
};
use crate::ports::{SessionRepository, VerificationProvider};

use super::transitions::{SessionTransitions, TransitionOutcome};

/// Query to refresh a session from the provider.
#[derive(Debug, Clone)]
pub struct RefreshSessionCommand {
    pub session_id: SessionId,
    /// When set, sessions of another kind are reported as not found.
    pub kind: Option<VerificationKind>,
}

#[derive(Debug, Clone)]
pub struct RefreshSessionResult {
    pub session: VerificationSession,
    /// Raw review status reported by the provider, if it was asked.
    pub review_status: Option<String>,
    pub review_answer: Option<String>,
}

/// Handler for polling the provider.
///
/// Terminal sessions are returned as stored without a provider round trip.
pub struct RefreshSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    provider: Arc<dyn VerificationProvider>,
    transitions: SessionTransitions,
}

impl RefreshSessionHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        provider: Arc<dyn VerificationProvider>,
        transitions: SessionTransitions,
    ) -> Self {
        Self {
            sessions,
            provider,
            transitions,
        }
    }

    pub async fn handle(
        &self,
        cmd: RefreshSessionCommand,
    ) -> Result<RefreshSessionResult, VerificationError> {
        // 1. Load the session
        let session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .filter(|s| cmd.kind.map_or(true, |kind| s.kind == kind))
            .ok_or_else(|| VerificationError::session_not_found(cmd.session_id.as_str()))?;

        if session.is_terminal() {
            return Ok(RefreshSessionResult {
                session,
                review_status: None,
                review_answer: None,
            });
        }

        // 2. Ask the provider
        let review = self.provider.get_review(&session.session_id).await?;
        let target = resolve_status(&review.review_status, review.review_answer.as_deref());

        tracing::debug!(
            session_id = %session.session_id,
            review_status = %review.review_status,
            review_answer = ?review.review_answer,
            mapped = %target,
            "Provider review fetched"
        );

        // 3. Apply the mapped status
        let mut patch = Map::new();
        patch.insert("last_review_status".to_string(), json!(review.review_status));
        if let Some(answer) = &review.review_answer {
            patch.insert("last_review_answer".to_string(), json!(answer));
        }

        let outcome = self.transitions.transition(session, target, patch).await?;
        if let TransitionOutcome::Ignored { session, requested } = &outcome {
            tracing::warn!(
                session_id = %session.session_id,
                requested = %requested,
                "Provider review disagrees with stored terminal status"
            );
        }

        Ok(RefreshSessionResult {
            session: outcome.into_session(),
            review_status: Some(review.review_status),
            review_answer: review.review_answer,
        })
    }
}
