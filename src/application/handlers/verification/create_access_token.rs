//! CreateAccessTokenHandler - Issues provider SDK tokens.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::verification::{VerificationError, VerificationKind};
use crate::ports::{AccessToken, SessionRepository, VerificationProvider};

use super::levels::VerificationLevels;

#[derive(Debug, Clone)]
pub struct CreateAccessTokenCommand {
    pub user_id: UserId,
    pub kind: VerificationKind,
}

#[derive(Debug, Clone)]
pub struct CreateAccessTokenResult {
    pub token: AccessToken,
    pub level_name: String,
}

/// Handler for SDK access tokens.
///
/// The token is bound to the external id of the user's latest session of the
/// kind, so the SDK continues that applicant. Users without a session get a
/// token for their plain user id.
pub struct CreateAccessTokenHandler {
    sessions: Arc<dyn SessionRepository>,
    provider: Arc<dyn VerificationProvider>,
    levels: VerificationLevels,
}

impl CreateAccessTokenHandler {
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
        cmd: CreateAccessTokenCommand,
    ) -> Result<CreateAccessTokenResult, VerificationError> {
        let external_user_id = match self.sessions.find_latest(&cmd.user_id, cmd.kind).await? {
            Some(session) => session.external_user_id,
            None => cmd.user_id.to_string(),
        };
        let level_name = self.levels.for_kind(cmd.kind).to_string();

        let token = self
            .provider
            .create_access_token(&external_user_id, &level_name)
            .await?;

        tracing::info!(
            user_id = %cmd.user_id,
            kind = %cmd.kind,
            "SDK access token issued"
        );

        Ok(CreateAccessTokenResult { token, level_name })
    }
}
