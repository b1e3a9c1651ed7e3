//! Provider review vocabulary and its mapping onto internal statuses.
//!
//! The provider reports review progress as free-form strings. They are parsed
//! into a closed enum with an explicit `Unknown` arm so every input maps to a
//! defined outcome.

use super::status::VerificationStatus;

/// Review status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderReviewStatus {
    Init,
    Pending,
    Queued,
    Prechecked,
    OnHold,
    Completed,
    Approved,
    Rejected,
    Failed,
    /// Any value this service does not recognise.
    Unknown(String),
}

impl ProviderReviewStatus {
    /// Parses a provider status string (case-insensitive).
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "init" => ProviderReviewStatus::Init,
            "pending" => ProviderReviewStatus::Pending,
            "queued" => ProviderReviewStatus::Queued,
            "prechecked" => ProviderReviewStatus::Prechecked,
            "onhold" => ProviderReviewStatus::OnHold,
            "completed" => ProviderReviewStatus::Completed,
            "approved" => ProviderReviewStatus::Approved,
            "rejected" => ProviderReviewStatus::Rejected,
            "failed" => ProviderReviewStatus::Failed,
            _ => ProviderReviewStatus::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProviderReviewStatus::Init => "init",
            ProviderReviewStatus::Pending => "pending",
            ProviderReviewStatus::Queued => "queued",
            ProviderReviewStatus::Prechecked => "prechecked",
            ProviderReviewStatus::OnHold => "onHold",
            ProviderReviewStatus::Completed => "completed",
            ProviderReviewStatus::Approved => "approved",
            ProviderReviewStatus::Rejected => "rejected",
            ProviderReviewStatus::Failed => "failed",
            ProviderReviewStatus::Unknown(raw) => raw,
        }
    }
}

/// Final answer attached to a completed review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAnswer {
    Green,
    Red,
    Other(String),
}

impl ReviewAnswer {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "GREEN" => ReviewAnswer::Green,
            "RED" => ReviewAnswer::Red,
            _ => ReviewAnswer::Other(raw.to_string()),
        }
    }
}

/// Internal outcome of a provider review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Completed,
    Failed,
    Pending,
}

impl ReviewOutcome {
    /// Session status for this outcome.
    ///
    /// A completed review answered `RED` is a rejection.
    pub fn into_status(self, answer: Option<&ReviewAnswer>) -> VerificationStatus {
        match (self, answer) {
            (ReviewOutcome::Completed, Some(ReviewAnswer::Red)) => VerificationStatus::Rejected,
            (ReviewOutcome::Completed, _) => VerificationStatus::Completed,
            (ReviewOutcome::Failed, _) => VerificationStatus::Failed,
            (ReviewOutcome::Pending, _) => VerificationStatus::Pending,
        }
    }
}

/// Maps a provider review status to an internal outcome.
///
/// Total: unrecognised statuses fall back to `Pending` and are logged.
pub fn map_review_status(status: &ProviderReviewStatus) -> ReviewOutcome {
    match status {
        ProviderReviewStatus::Approved | ProviderReviewStatus::Completed => {
            ReviewOutcome::Completed
        }
        ProviderReviewStatus::Rejected | ProviderReviewStatus::Failed => ReviewOutcome::Failed,
        ProviderReviewStatus::Init
        | ProviderReviewStatus::Pending
        | ProviderReviewStatus::Queued
        | ProviderReviewStatus::Prechecked
        | ProviderReviewStatus::OnHold => ReviewOutcome::Pending,
        ProviderReviewStatus::Unknown(raw) => {
            tracing::warn!(provider_status = %raw, "Unknown provider review status, treating as pending");
            ReviewOutcome::Pending
        }
    }
}

/// Convenience wrapper: raw provider strings straight to a session status.
pub fn resolve_status(review_status: &str, review_answer: Option<&str>) -> VerificationStatus {
    let outcome = map_review_status(&ProviderReviewStatus::parse(review_status));
    let answer = review_answer.map(ReviewAnswer::parse);
    outcome.into_status(answer.as_ref())
}
