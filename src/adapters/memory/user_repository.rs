//! In-memory user summary repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, SessionId, Timestamp, UserId};
use crate::domain::verification::{UserRecord, VerificationKind, VerificationStatus};
use crate::ports::UserRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, UserRecord>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserRecord>, DomainError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn record_terminal(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
        session_id: &SessionId,
        status: VerificationStatus,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut users = self.users.write().await;
        users
            .entry(user_id.clone())
            .or_insert_with(|| UserRecord::empty(user_id.clone(), at))
            .record_terminal(kind, session_id.clone(), status, at);
        Ok(())
    }
}
