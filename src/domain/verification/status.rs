//! Verification session status state machine.
//!
//! ```text
//! initiated ──► pending ──► completed
//!     │            │   ├──► failed
//!     │            │   └──► rejected
//!     └────────────┴──────► (any terminal state)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of a verification session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Applicant created at the provider, no artifacts yet.
    Initiated,

    /// Artifacts submitted, awaiting the provider's review.
    Pending,

    /// Provider approved the applicant.
    Completed,

    /// Provider could not verify the applicant.
    Failed,

    /// Provider reviewed and rejected the applicant.
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Initiated => "initiated",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Completed => "completed",
            VerificationStatus::Failed => "failed",
            VerificationStatus::Rejected => "rejected",
        }
    }

    /// Parses the stored representation.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.to_lowercase().as_str() {
            "initiated" => Ok(VerificationStatus::Initiated),
            "pending" => Ok(VerificationStatus::Pending),
            "completed" => Ok(VerificationStatus::Completed),
            "failed" => Ok(VerificationStatus::Failed),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown verification status '{}'", other),
            )),
        }
    }

    /// Initiated or pending sessions still accept artifacts and results.
    pub fn is_active(&self) -> bool {
        matches!(self, VerificationStatus::Initiated | VerificationStatus::Pending)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for VerificationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use VerificationStatus::*;
        matches!(
            (self, target),
            (Initiated, Pending)
                | (Initiated, Completed)
                | (Initiated, Failed)
                | (Initiated, Rejected)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Rejected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use VerificationStatus::*;
        match self {
            Initiated => vec![Pending, Completed, Failed, Rejected],
            Pending => vec![Completed, Failed, Rejected],
            Completed | Failed | Rejected => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VerificationStatus::*;

    #[test]
    fn initiated_moves_to_pending() {
        assert_eq!(Initiated.transition_to(Pending), Ok(Pending));
    }

    #[test]
    fn pending_moves_to_every_terminal_state() {
        for target in [Completed, Failed, Rejected] {
            assert!(Pending.can_transition_to(&target), "pending -> {:?}", target);
        }
    }

    #[test]
    fn pending_cannot_return_to_initiated() {
        assert!(Pending.transition_to(Initiated).is_err());
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for status in [Completed, Failed, Rejected] {
            assert!(status.is_terminal());
            assert!(!status.is_active());
            assert!(status.transition_to(Pending).is_err());
        }
    }

    #[test]
    fn self_transition_is_not_a_transition() {
        assert!(!Pending.can_transition_to(&Pending));
        assert!(!Completed.can_transition_to(&Completed));
    }

    #[test]
    fn parse_round_trips_every_status() {
        for status in [Initiated, Pending, Completed, Failed, Rejected] {
            assert_eq!(VerificationStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(VerificationStatus::parse("approved").is_err());
    }
}
