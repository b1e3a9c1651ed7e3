//! GetUserStatusHandler - Query handler for a user's verification summary.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::verification::{VerificationError, VerificationKind, VerificationSession};
use crate::ports::{SessionRepository, UserRepository};

#[derive(Debug, Clone)]
pub struct GetUserStatusQuery {
    pub user_id: UserId,
}

/// Summary for one verification kind.
#[derive(Debug, Clone, PartialEq)]
pub struct KindSummary {
    pub completed: bool,
    pub latest_session: Option<VerificationSession>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserStatusResult {
    pub user_id: UserId,
    pub liveness: KindSummary,
    pub kyc: KindSummary,
}

impl UserStatusResult {
    /// True once both kinds have completed.
    pub fn fully_verified(&self) -> bool {
        self.liveness.completed && self.kyc.completed
    }
}

/// Handler for user status queries.
///
/// Unknown users get an empty summary rather than an error.
pub struct GetUserStatusHandler {
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
}

impl GetUserStatusHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { sessions, users }
    }

    pub async fn handle(
        &self,
        query: GetUserStatusQuery,
    ) -> Result<UserStatusResult, VerificationError> {
        let record = self.users.find(&query.user_id).await?;
        let completed = |kind: VerificationKind| record.as_ref().map_or(false, |r| r.completed(kind));

        let liveness = KindSummary {
            completed: completed(VerificationKind::Liveness),
            latest_session: self
                .sessions
                .find_latest(&query.user_id, VerificationKind::Liveness)
                .await?,
        };
        let kyc = KindSummary {
            completed: completed(VerificationKind::Kyc),
            latest_session: self
                .sessions
                .find_latest(&query.user_id, VerificationKind::Kyc)
                .await?,
        };

        Ok(UserStatusResult {
            user_id: query.user_id,
            liveness,
            kyc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySessionRepository, InMemoryUserRepository};
    use crate::domain::foundation::{SessionId, Timestamp};
    use crate::domain::verification::VerificationStatus;

    #[tokio::test]
    async fn unknown_user_has_empty_summary() {
        let handler = GetUserStatusHandler::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
        );

        let result = handler
            .handle(GetUserStatusQuery {
                user_id: UserId::new("ghost").unwrap(),
            })
            .await
            .unwrap();

        assert!(!result.fully_verified());
        assert!(result.liveness.latest_session.is_none());
        assert!(result.kyc.latest_session.is_none());
    }

    #[tokio::test]
    async fn combines_record_and_latest_sessions() {
        let sessions = InMemorySessionRepository::new();
        let users = InMemoryUserRepository::new();
        let user = UserId::new("bob").unwrap();

        let mut liveness = VerificationSession::start(
            SessionId::new("l-1").unwrap(),
            user.clone(),
            "bob.l",
            VerificationKind::Liveness,
            "liveness-level",
            Timestamp::now(),
        );
        liveness.status = VerificationStatus::Completed;
        sessions.insert(liveness).await;
        users
            .record_terminal(
                &user,
                VerificationKind::Liveness,
                &SessionId::new("l-1").unwrap(),
                VerificationStatus::Completed,
                Timestamp::now(),
            )
            .await
            .unwrap();

        let kyc = VerificationSession::start(
            SessionId::new("k-1").unwrap(),
            user.clone(),
            "bob.k",
            VerificationKind::Kyc,
            "kyc-level",
            Timestamp::now(),
        );
        sessions.insert(kyc).await;

        let handler = GetUserStatusHandler::new(Arc::new(sessions), Arc::new(users));
        let result = handler
            .handle(GetUserStatusQuery { user_id: user })
            .await
            .unwrap();

        assert!(result.liveness.completed);
        assert!(!result.kyc.completed);
        assert!(!result.fully_verified());
        assert_eq!(
            result.kyc.latest_session.unwrap().status,
            VerificationStatus::Initiated
        );
    }
}
