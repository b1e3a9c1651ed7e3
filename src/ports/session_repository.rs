//! Verification session repository port.
//!
//! # Design
//!
//! - **Atomic updates**: status changes are compare-and-set on the current
//!   status, so two concurrent writers cannot both move the same session
//! - **Append-only metadata**: patches merge into the stored JSON object and
//!   completed steps are appended, never rewritten
//! - **No deletes**: sessions are kept for audit

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::foundation::{DomainError, SessionId, Timestamp, UserId};
use crate::domain::verification::{VerificationKind, VerificationSession, VerificationStatus};

/// A single atomic change to a session row.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUpdate {
    pub session_id: SessionId,
    /// The update only applies while the stored status equals this value.
    pub expected_status: VerificationStatus,
    pub new_status: VerificationStatus,
    /// Keys merged shallowly into `provider_metadata`.
    pub metadata_patch: Map<String, Value>,
    /// Step appended to `steps_completed`.
    pub step: Option<String>,
    pub at: Timestamp,
}

impl SessionUpdate {
    pub fn new(
        session_id: SessionId,
        expected_status: VerificationStatus,
        new_status: VerificationStatus,
    ) -> Self {
        Self {
            session_id,
            expected_status,
            new_status,
            metadata_patch: Map::new(),
            step: None,
            at: Timestamp::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata_patch.insert(key.into(), value);
        self
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }
}

/// Result of a compare-and-set update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// Stored status no longer matched `expected_status`; nothing was written.
    StatusMismatch,
}

/// Repository port for verification sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session.
    ///
    /// # Errors
    ///
    /// - `SessionExists` if the session id or external user id is taken
    /// - `ActiveSessionExists` if the user already has an active session of
    ///   this kind
    /// - `DatabaseError` on persistence failure
    async fn create(&self, session: &VerificationSession) -> Result<(), DomainError>;

    /// Find a session by its id (the provider applicant id).
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<VerificationSession>, DomainError>;

    /// Find a session by the identifier registered with the provider.
    async fn find_by_external_user_id(
        &self,
        external_user_id: &str,
    ) -> Result<Option<VerificationSession>, DomainError>;

    /// The user's initiated or pending session of `kind`, if any.
    async fn find_active(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
    ) -> Result<Option<VerificationSession>, DomainError>;

    /// The user's most recently created session of `kind`, if any.
    async fn find_latest(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
    ) -> Result<Option<VerificationSession>, DomainError>;

    /// Apply a status change and metadata patch atomically.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if no session has this id
    /// - `DatabaseError` on persistence failure
    async fn apply_update(&self, update: &SessionUpdate) -> Result<UpdateOutcome, DomainError>;
}
