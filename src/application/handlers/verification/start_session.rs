//! StartSessionHandler - Command handler for starting liveness and KYC sessions.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::foundation::{ErrorCode, SessionId, Timestamp, UserId};
use crate::domain::verification::{VerificationError, VerificationKind, VerificationSession};
use crate::ports::{CreateApplicantRequest, SessionRepository, VerificationProvider};

use super::levels::VerificationLevels;

/// Command to start a verification session.
#[derive(Debug, Clone)]
pub struct StartSessionCommand {
    pub user_id: UserId,
    pub kind: VerificationKind,
    /// Caller-supplied context kept with the session.
    pub client_metadata: Option<Value>,
}

/// Result of starting a session.
#[derive(Debug, Clone)]
pub struct StartSessionResult {
    pub session: VerificationSession,
    /// False when an existing active session was returned instead.
    pub created: bool,
}

/// Handler for starting verification sessions.
///
/// A user has at most one active session per kind; starting again returns it.
pub struct StartSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    provider: Arc<dyn VerificationProvider>,
    levels: VerificationLevels,
}

impl StartSessionHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        provider: Arc<dyn VerificationProvider>,
        levels: VerificationLevels,
    ) -> Self {
        Self {
            sessions,
            provider,
            levels,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartSessionCommand,
    ) -> Result<StartSessionResult, VerificationError> {
        // 1. Reuse the active session if there is one
        if let Some(existing) = self.sessions.find_active(&cmd.user_id, cmd.kind).await? {
            tracing::info!(
                session_id = %existing.session_id,
                user_id = %cmd.user_id,
                kind = %cmd.kind,
                "Returning existing active session"
            );
            return Ok(StartSessionResult {
                session: existing,
                created: false,
            });
        }

        // 2. Create the applicant at the provider
        let level_name = self.levels.for_kind(cmd.kind).to_string();
        let external_user_id = VerificationSession::generate_external_user_id(&cmd.user_id);

        let applicant = self
            .provider
            .create_applicant(CreateApplicantRequest {
                external_user_id: external_user_id.clone(),
                level_name: level_name.clone(),
            })
            .await?;

        let session_id = SessionId::new(applicant.id).map_err(|_| {
            VerificationError::upstream("Provider returned an empty applicant id")
        })?;

        // 3. Persist the session
        let mut session = VerificationSession::start(
            session_id,
            cmd.user_id.clone(),
            external_user_id,
            cmd.kind,
            &level_name,
            Timestamp::now(),
        );
        if let (Some(client_metadata), Some(metadata)) = (
            cmd.client_metadata,
            session.provider_metadata.as_object_mut(),
        ) {
            metadata.insert("client_metadata".to_string(), client_metadata);
        }

        match self.sessions.create(&session).await {
            Ok(()) => {}
            Err(e) if e.code == ErrorCode::ActiveSessionExists => {
                // A concurrent start won; hand back its session.
                if let Some(existing) = self.sessions.find_active(&cmd.user_id, cmd.kind).await? {
                    tracing::warn!(
                        session_id = %existing.session_id,
                        orphaned_applicant = %session.session_id,
                        "Concurrent session start, returning the winner"
                    );
                    return Ok(StartSessionResult {
                        session: existing,
                        created: false,
                    });
                }
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            session_id = %session.session_id,
            user_id = %cmd.user_id,
            kind = %cmd.kind,
            level_name = %level_name,
            "Verification session started"
        );

        Ok(StartSessionResult {
            session,
            created: true,
        })
    }
}
