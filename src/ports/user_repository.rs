//! User verification summary repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SessionId, Timestamp, UserId};
use crate::domain::verification::{UserRecord, VerificationKind, VerificationStatus};

/// Repository port for per-user verification summaries.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find the summary for a user.
    ///
    /// Returns `None` if none of the user's sessions has finished yet.
    async fn find(&self, user_id: &UserId) -> Result<Option<UserRecord>, DomainError>;

    /// Upsert the summary after a session reached a terminal status.
    async fn record_terminal(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
        session_id: &SessionId,
        status: VerificationStatus,
        at: Timestamp,
    ) -> Result<(), DomainError>;
}
