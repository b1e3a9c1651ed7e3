//! In-memory session repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId, UserId};
use crate::domain::verification::{VerificationKind, VerificationSession};
use crate::ports::{SessionRepository, SessionUpdate, UpdateOutcome};

/// In-memory storage for verification sessions.
///
/// Enforces the same uniqueness rules as the database schema: unique session
/// id, unique external user id, and one active session per user and kind.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, VerificationSession>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session directly, bypassing uniqueness checks (test setup).
    pub async fn insert(&self, session: VerificationSession) {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &VerificationSession) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&session.session_id)
            || sessions
                .values()
                .any(|s| s.external_user_id == session.external_user_id)
        {
            return Err(DomainError::new(ErrorCode::SessionExists, "Session already exists"));
        }

        if session.is_active()
            && sessions.values().any(|s| {
                s.user_id == session.user_id && s.kind == session.kind && s.is_active()
            })
        {
            return Err(DomainError::new(
                ErrorCode::ActiveSessionExists,
                "User already has an active session of this kind",
            ));
        }

        sessions.insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<VerificationSession>, DomainError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn find_by_external_user_id(
        &self,
        external_user_id: &str,
    ) -> Result<Option<VerificationSession>, DomainError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|s| s.external_user_id == external_user_id)
            .cloned())
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
    ) -> Result<Option<VerificationSession>, DomainError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| &s.user_id == user_id && s.kind == kind && s.is_active())
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn find_latest(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
    ) -> Result<Option<VerificationSession>, DomainError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| &s.user_id == user_id && s.kind == kind)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn apply_update(&self, update: &SessionUpdate) -> Result<UpdateOutcome, DomainError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&update.session_id).ok_or_else(|| {
            DomainError::new(ErrorCode::SessionNotFound, update.session_id.to_string())
        })?;

        if session.status != update.expected_status {
            return Ok(UpdateOutcome::StatusMismatch);
        }

        session.apply(
            update.new_status,
            &update.metadata_patch,
            update.step.as_deref(),
            update.at,
        );
        Ok(UpdateOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::verification::VerificationStatus;
    use serde_json::json;

    fn session(id: &str, user: &str, kind: VerificationKind) -> VerificationSession {
        VerificationSession::start(
            SessionId::new(id).unwrap(),
            UserId::new(user).unwrap(),
            format!("{}.{}", user, id),
            kind,
            "level",
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn create_and_find() {
        let repo = InMemorySessionRepository::new();
        repo.create(&session("a-1", "u", VerificationKind::Kyc)).await.unwrap();

        let found = repo.find_by_id(&SessionId::new("a-1").unwrap()).await.unwrap();
        assert!(found.is_some());
        let by_external = repo.find_by_external_user_id("u.a-1").await.unwrap();
        assert_eq!(by_external.unwrap().session_id.as_str(), "a-1");
    }

    #[tokio::test]
    async fn create_rejects_second_active_session_of_same_kind() {
        let repo = InMemorySessionRepository::new();
        repo.create(&session("a-1", "u", VerificationKind::Kyc)).await.unwrap();

        let err = repo
            .create(&session("a-2", "u", VerificationKind::Kyc))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ActiveSessionExists);

        repo.create(&session("a-3", "u", VerificationKind::Liveness))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let repo = InMemorySessionRepository::new();
        repo.create(&session("a-1", "u", VerificationKind::Kyc)).await.unwrap();
        let err = repo
            .create(&session("a-1", "v", VerificationKind::Kyc))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionExists);
    }

    #[tokio::test]
    async fn apply_update_is_compare_and_set() {
        let repo = InMemorySessionRepository::new();
        repo.create(&session("a-1", "u", VerificationKind::Liveness)).await.unwrap();
        let id = SessionId::new("a-1").unwrap();

        let update = SessionUpdate::new(id.clone(), VerificationStatus::Initiated, VerificationStatus::Pending)
            .with_metadata("selfie_image_id", json!("img-1"))
            .with_step("selfie");
        assert_eq!(repo.apply_update(&update).await.unwrap(), UpdateOutcome::Applied);

        // Same expectation again no longer matches.
        assert_eq!(
            repo.apply_update(&update).await.unwrap(),
            UpdateOutcome::StatusMismatch
        );

        let stored = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Pending);
        assert_eq!(stored.steps_completed(), vec!["selfie".to_string()]);
    }

    #[tokio::test]
    async fn apply_update_unknown_session_is_not_found() {
        let repo = InMemorySessionRepository::new();
        let update = SessionUpdate::new(
            SessionId::new("missing").unwrap(),
            VerificationStatus::Pending,
            VerificationStatus::Completed,
        );
        let err = repo.apply_update(&update).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn find_active_ignores_terminal_sessions() {
        let repo = InMemorySessionRepository::new();
        let mut done = session("a-1", "u", VerificationKind::Kyc);
        done.status = VerificationStatus::Completed;
        repo.insert(done).await;

        let user = UserId::new("u").unwrap();
        assert!(repo.find_active(&user, VerificationKind::Kyc).await.unwrap().is_none());
        assert!(repo.find_latest(&user, VerificationKind::Kyc).await.unwrap().is_some());
    }
}
