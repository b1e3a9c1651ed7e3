//! VerificationSession aggregate.
//!
//! One session per provider applicant. The session is created when a user
//! starts a verification flow and is afterwards mutated only through status
//! transitions and metadata patches. Sessions are never deleted.
//!
//! # Invariants
//!
//! - `session_id` is the provider's applicant id
//! - `external_user_id` is unique across all sessions
//! - At most one active (initiated/pending) session per `(user_id, kind)`
//! - Status changes follow [`VerificationStatus`]'s state machine

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::foundation::{SessionId, StateMachine, Timestamp, UserId};

use super::errors::VerificationError;
use super::kind::VerificationKind;
use super::status::VerificationStatus;

/// Metadata key holding the ordered list of completed steps.
pub const STEPS_COMPLETED_KEY: &str = "steps_completed";

/// A single verification attempt tracked against the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSession {
    /// Provider applicant id.
    pub session_id: SessionId,

    /// Application user this session belongs to.
    pub user_id: UserId,

    /// Identifier registered with the provider for this applicant.
    pub external_user_id: String,

    pub kind: VerificationKind,

    pub status: VerificationStatus,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,

    /// Accumulated provider facts (image ids, review results, callbacks).
    pub provider_metadata: Value,
}

/// Outcome of planning a status change against the current session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Target equals the current status; nothing to write.
    Unchanged,

    /// A valid transition to apply.
    Apply {
        from: VerificationStatus,
        to: VerificationStatus,
    },
}

impl VerificationSession {
    /// Creates a freshly started session in `initiated`.
    pub fn start(
        session_id: SessionId,
        user_id: UserId,
        external_user_id: impl Into<String>,
        kind: VerificationKind,
        level_name: &str,
        now: Timestamp,
    ) -> Self {
        Self {
            session_id,
            user_id,
            external_user_id: external_user_id.into(),
            kind,
            status: VerificationStatus::Initiated,
            created_at: now,
            updated_at: now,
            provider_metadata: json!({
                "level_name": level_name,
                STEPS_COMPLETED_KEY: [],
            }),
        }
    }

    /// Generates a fresh provider-facing identifier for `user_id`.
    ///
    /// The value is opaque: nothing ever parses it back.
    pub fn generate_external_user_id(user_id: &UserId) -> String {
        format!("{}.{}", user_id, Uuid::new_v4().simple())
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Decides how to reach `target` from the current status.
    ///
    /// Re-applying the current status is a no-op rather than an error, which
    /// keeps replayed callbacks idempotent.
    pub fn plan_transition(
        &self,
        target: VerificationStatus,
    ) -> Result<TransitionPlan, VerificationError> {
        if self.status == target {
            return Ok(TransitionPlan::Unchanged);
        }

        self.status
            .transition_to(target)
            .map(|to| TransitionPlan::Apply {
                from: self.status,
                to,
            })
            .map_err(|_| {
                VerificationError::invalid_state(
                    self.status.as_str(),
                    format!("move to {}", target.as_str()),
                )
            })
    }

    /// Status a successful artifact upload moves the session to.
    ///
    /// Fails for terminal sessions, which accept no further artifacts.
    pub fn status_after_artifact(&self) -> Result<VerificationStatus, VerificationError> {
        match self.status {
            VerificationStatus::Initiated | VerificationStatus::Pending => {
                Ok(VerificationStatus::Pending)
            }
            other => Err(VerificationError::invalid_state(
                other.as_str(),
                "submit artifact to",
            )),
        }
    }

    /// Steps recorded so far, in submission order.
    pub fn steps_completed(&self) -> Vec<String> {
        self.provider_metadata
            .get(STEPS_COMPLETED_KEY)
            .and_then(Value::as_array)
            .map(|steps| {
                steps
                    .iter()
                    .filter_map(|s| s.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reads a string value from the metadata.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.provider_metadata.get(key).and_then(Value::as_str)
    }

    /// True when merging `patch` would change any stored metadata value.
    pub fn metadata_differs(&self, patch: &Map<String, Value>) -> bool {
        patch
            .iter()
            .any(|(key, value)| self.provider_metadata.get(key) != Some(value))
    }

    /// Applies a status and metadata change in memory.
    ///
    /// Mirrors what the session repository does atomically: metadata keys are
    /// merged shallowly and `step` is appended to the completed steps.
    pub fn apply(
        &mut self,
        status: VerificationStatus,
        metadata_patch: &Map<String, Value>,
        step: Option<&str>,
        at: Timestamp,
    ) {
        let mut metadata = match std::mem::take(&mut self.provider_metadata) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in metadata_patch {
            metadata.insert(key.clone(), value.clone());
        }
        if let Some(step) = step {
            let steps = metadata
                .entry(STEPS_COMPLETED_KEY)
                .or_insert_with(|| Value::Array(Vec::new()));
            match steps {
                Value::Array(items) => items.push(Value::String(step.to_string())),
                other => *other = json!([step]),
            }
        }

        self.provider_metadata = Value::Object(metadata);
        self.status = status;
        self.updated_at = at;
    }
}
