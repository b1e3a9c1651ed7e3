//! Per-user verification summary.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, Timestamp, UserId};

use super::kind::VerificationKind;
use super::status::VerificationStatus;

/// Latest verification results for a user, across both kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub liveness_completed: bool,
    pub kyc_completed: bool,
    pub last_liveness_session_id: Option<SessionId>,
    pub last_kyc_session_id: Option<SessionId>,
    pub updated_at: Timestamp,
}

impl UserRecord {
    /// A user with no finished sessions.
    pub fn empty(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            liveness_completed: false,
            kyc_completed: false,
            last_liveness_session_id: None,
            last_kyc_session_id: None,
            updated_at: now,
        }
    }

    /// Records a session that reached a terminal status.
    ///
    /// The completed flag for the kind follows the latest terminal session.
    pub fn record_terminal(
        &mut self,
        kind: VerificationKind,
        session_id: SessionId,
        status: VerificationStatus,
        at: Timestamp,
    ) {
        let completed = status == VerificationStatus::Completed;
        match kind {
            VerificationKind::Liveness => {
                self.liveness_completed = completed;
                self.last_liveness_session_id = Some(session_id);
            }
            VerificationKind::Kyc => {
                self.kyc_completed = completed;
                self.last_kyc_session_id = Some(session_id);
            }
        }
        self.updated_at = at;
    }

    pub fn completed(&self, kind: VerificationKind) -> bool {
        match kind {
            VerificationKind::Liveness => self.liveness_completed,
            VerificationKind::Kyc => self.kyc_completed,
        }
    }

    pub fn last_session_id(&self, kind: VerificationKind) -> Option<&SessionId> {
        match kind {
            VerificationKind::Liveness => self.last_liveness_session_id.as_ref(),
            VerificationKind::Kyc => self.last_kyc_session_id.as_ref(),
        }
    }
}
