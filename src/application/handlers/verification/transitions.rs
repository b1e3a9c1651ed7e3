//! Session state changes shared by the verification handlers.
//!
//! Every write is a compare-and-set against the status the caller last saw.
//! On a mismatch the session is reloaded and the change re-planned once.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::foundation::StateMachine;
use crate::domain::verification::{
    TransitionPlan, VerificationError, VerificationSession, VerificationStatus,
};
use crate::ports::{SessionRepository, SessionUpdate, UpdateOutcome, UserRepository};

const MAX_ATTEMPTS: usize = 2;

/// What happened to a requested status change.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Status moved from `from` to the session's current status.
    Applied {
        session: VerificationSession,
        from: VerificationStatus,
    },

    /// Session already had the requested status; only new metadata was written.
    Unchanged { session: VerificationSession },

    /// Session is terminal with a different status; the request was dropped.
    Ignored {
        session: VerificationSession,
        requested: VerificationStatus,
    },
}

impl TransitionOutcome {
    pub fn session(&self) -> &VerificationSession {
        match self {
            TransitionOutcome::Applied { session, .. }
            | TransitionOutcome::Unchanged { session }
            | TransitionOutcome::Ignored { session, .. } => session,
        }
    }

    pub fn into_session(self) -> VerificationSession {
        match self {
            TransitionOutcome::Applied { session, .. }
            | TransitionOutcome::Unchanged { session }
            | TransitionOutcome::Ignored { session, .. } => session,
        }
    }
}

/// Applies status changes and artifact records to sessions.
#[derive(Clone)]
pub struct SessionTransitions {
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
}

impl SessionTransitions {
    pub fn new(sessions: Arc<dyn SessionRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { sessions, users }
    }

    /// Moves `session` to `target`, merging `patch` into its metadata.
    ///
    /// Re-applying the current status only writes when `patch` carries values
    /// the session does not already hold, so an identical redelivery writes
    /// nothing. A terminal session asked to move elsewhere is left alone and
    /// reported as `Ignored`.
    pub async fn transition(
        &self,
        session: VerificationSession,
        target: VerificationStatus,
        patch: Map<String, Value>,
    ) -> Result<TransitionOutcome, VerificationError> {
        let mut current = session;

        for _ in 0..MAX_ATTEMPTS {
            let from = match current.plan_transition(target) {
                Ok(TransitionPlan::Unchanged) => {
                    if current.metadata_differs(&patch) {
                        let status = current.status;
                        let mut update =
                            SessionUpdate::new(current.session_id.clone(), status, status);
                        update.metadata_patch = patch.clone();
                        match self.sessions.apply_update(&update).await? {
                            UpdateOutcome::Applied => {
                                current.apply(status, &update.metadata_patch, None, update.at);
                            }
                            UpdateOutcome::StatusMismatch => {
                                current = self.reload(&current).await?;
                                continue;
                            }
                        }
                    }
                    self.reconcile_user(&current).await?;
                    return Ok(TransitionOutcome::Unchanged { session: current });
                }
                Ok(TransitionPlan::Apply { from, .. }) => from,
                Err(_) if current.is_terminal() => {
                    tracing::warn!(
                        session_id = %current.session_id,
                        current_status = %current.status,
                        requested_status = %target,
                        "Ignoring status change for terminal session"
                    );
                    return Ok(TransitionOutcome::Ignored {
                        session: current,
                        requested: target,
                    });
                }
                Err(e) => return Err(e),
            };

            let mut update = SessionUpdate::new(current.session_id.clone(), from, target);
            update.metadata_patch = patch.clone();

            match self.sessions.apply_update(&update).await? {
                UpdateOutcome::Applied => {
                    current.apply(target, &update.metadata_patch, None, update.at);
                    tracing::info!(
                        session_id = %current.session_id,
                        kind = %current.kind,
                        from = %from,
                        to = %target,
                        "Verification session transitioned"
                    );
                    self.record_if_terminal(&current).await?;
                    return Ok(TransitionOutcome::Applied {
                        session: current,
                        from,
                    });
                }
                UpdateOutcome::StatusMismatch => {
                    current = self.reload(&current).await?;
                }
            }
        }

        Err(VerificationError::infrastructure(format!(
            "Session {} kept changing during update",
            current.session_id
        )))
    }

    /// Records an uploaded artifact and moves the session to `pending`.
    ///
    /// Fails with `InvalidState` for terminal sessions.
    pub async fn record_artifact(
        &self,
        session: VerificationSession,
        patch: Map<String, Value>,
        step: &str,
    ) -> Result<VerificationSession, VerificationError> {
        let mut current = session;

        for _ in 0..MAX_ATTEMPTS {
            let target = current.status_after_artifact()?;
            let mut update = SessionUpdate::new(current.session_id.clone(), current.status, target)
                .with_step(step);
            update.metadata_patch = patch.clone();

            match self.sessions.apply_update(&update).await? {
                UpdateOutcome::Applied => {
                    let from = current.status;
                    current.apply(target, &update.metadata_patch, Some(step), update.at);
                    if from != target {
                        tracing::info!(
                            session_id = %current.session_id,
                            from = %from,
                            to = %target,
                            step = step,
                            "Verification session transitioned"
                        );
                    }
                    return Ok(current);
                }
                UpdateOutcome::StatusMismatch => {
                    current = self.reload(&current).await?;
                }
            }
        }

        Err(VerificationError::infrastructure(format!(
            "Session {} kept changing during update",
            current.session_id
        )))
    }

    async fn reload(
        &self,
        session: &VerificationSession,
    ) -> Result<VerificationSession, VerificationError> {
        tracing::debug!(session_id = %session.session_id, "Session status changed concurrently, reloading");
        self.sessions
            .find_by_id(&session.session_id)
            .await?
            .ok_or_else(|| VerificationError::session_not_found(session.session_id.as_str()))
    }

    /// Re-records a terminal session in the user summary when an earlier
    /// upsert was lost, unless a newer session of the kind has superseded it.
    async fn reconcile_user(&self, session: &VerificationSession) -> Result<(), VerificationError> {
        if !session.is_terminal() {
            return Ok(());
        }

        let record = self.users.find(&session.user_id).await?;
        let recorded = record
            .as_ref()
            .and_then(|r| r.last_session_id(session.kind))
            .map_or(false, |id| *id == session.session_id);
        if recorded {
            return Ok(());
        }

        let latest = self
            .sessions
            .find_latest(&session.user_id, session.kind)
            .await?;
        if latest.map_or(true, |l| l.session_id != session.session_id) {
            return Ok(());
        }

        tracing::warn!(
            session_id = %session.session_id,
            user_id = %session.user_id,
            "User record missing terminal session, recording it again"
        );
        self.record_if_terminal(session).await
    }

    async fn record_if_terminal(
        &self,
        session: &VerificationSession,
    ) -> Result<(), VerificationError> {
        if !session.status.is_terminal() {
            return Ok(());
        }
        self.users
            .record_terminal(
                &session.user_id,
                session.kind,
                &session.session_id,
                session.status,
                session.updated_at,
            )
            .await?;
        Ok(())
    }
}
