//! CompleteSessionHandler - Finalizes a session once the provider has decided.

use std::sync::Arc;

use crate::domain::foundation::{SessionId, UserId};
use crate::domain::verification::{VerificationError, VerificationKind, VerificationSession};

use crate::ports::SessionRepository;

use super::refresh_session::{RefreshSessionCommand, RefreshSessionHandler};

/// Command to complete a session.
#[derive(Debug, Clone)]
pub struct CompleteSessionCommand {
    pub session_id: SessionId,
    pub kind: VerificationKind,
    /// When present, the session must belong to this user.
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct CompleteSessionResult {
    pub session: VerificationSession,
    /// True once the session reached a terminal status. Otherwise the caller
    /// should retry later.
    pub is_final: bool,
}

/// Handler for session completion.
///
/// Completion is a refresh whose result is reported as final or not; the
/// provider alone decides the outcome. Ownership is checked before the
/// provider is consulted.
pub struct CompleteSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    refresh: RefreshSessionHandler,
}

impl CompleteSessionHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, refresh: RefreshSessionHandler) -> Self {
        Self { sessions, refresh }
    }

    pub async fn handle(
        &self,
        cmd: CompleteSessionCommand,
    ) -> Result<CompleteSessionResult, VerificationError> {
        let session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .filter(|s| s.kind == cmd.kind)
            .ok_or_else(|| VerificationError::session_not_found(cmd.session_id.as_str()))?;

        if let Some(user_id) = &cmd.user_id {
            if &session.user_id != user_id {
                return Err(VerificationError::validation(
                    "user_id",
                    "does not own this session",
                ));
            }
        }

        let refreshed = self
            .refresh
            .handle(RefreshSessionCommand {
                session_id: cmd.session_id.clone(),
                kind: Some(cmd.kind),
            })
            .await?;

        let is_final = refreshed.session.is_terminal();
        tracing::info!(
            session_id = %refreshed.session.session_id,
            status = %refreshed.session.status,
            is_final,
            "Completion requested"
        );

        Ok(CompleteSessionResult {
            session: refreshed.session,
            is_final,
        })
    }
}
