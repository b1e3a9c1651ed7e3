//! Provider callback payload.
//!
//! Parsed only after the payload digest has been verified against the raw
//! body bytes.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::foundation::SessionId;

use super::errors::VerificationError;
use super::review::resolve_status;
use super::status::VerificationStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    #[serde(default)]
    pub review_answer: Option<String>,
    #[serde(default)]
    pub reject_labels: Vec<String>,
    #[serde(default)]
    pub review_reject_type: Option<String>,
}

/// A review notification pushed by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCallback {
    #[serde(default)]
    pub applicant_id: Option<String>,

    #[serde(default)]
    pub review_status: Option<String>,

    #[serde(default)]
    pub external_user_id: Option<String>,

    #[serde(default)]
    pub review_result: Option<ReviewResult>,

    /// Event type, e.g. `applicantReviewed`.
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,

    #[serde(default)]
    pub level_name: Option<String>,

    #[serde(default)]
    pub inspection_id: Option<String>,

    #[serde(default)]
    pub correlation_id: Option<String>,

    /// Provider-side creation time; its format varies so it is kept raw.
    #[serde(default)]
    pub created_at_ms: Option<Value>,
}

/// A callback that passed structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCallback {
    pub applicant_id: SessionId,
    pub external_user_id: Option<String>,
    pub review_status: String,
    pub review_answer: Option<String>,
    pub event_type: Option<String>,
    /// The payload as received, for the session's metadata.
    pub raw: Value,
}

impl ParsedCallback {
    /// Parses and validates a verified callback body.
    pub fn parse(body: &[u8]) -> Result<Self, VerificationError> {
        let raw: Value = serde_json::from_slice(body)
            .map_err(|e| VerificationError::validation("body", format!("invalid JSON: {}", e)))?;

        if !raw.is_object() {
            return Err(VerificationError::validation(
                "body",
                "callback payload must be a JSON object",
            ));
        }

        let callback: ProviderCallback = serde_json::from_value(raw.clone())
            .map_err(|e| VerificationError::validation("body", e.to_string()))?;

        let applicant_id = callback
            .applicant_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| VerificationError::validation("applicantId", "is required"))?;

        let review_status = callback
            .review_status
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| VerificationError::validation("reviewStatus", "is required"))?;

        Ok(Self {
            applicant_id: SessionId::new(applicant_id)?,
            external_user_id: callback
                .external_user_id
                .filter(|id| !id.trim().is_empty()),
            review_status,
            review_answer: callback.review_result.and_then(|r| r.review_answer),
            event_type: callback.event_type,
            raw,
        })
    }

    /// Internal status this callback asks for.
    pub fn target_status(&self) -> VerificationStatus {
        resolve_status(&self.review_status, self.review_answer.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_payload() {
        let parsed =
            ParsedCallback::parse(br#"{"applicantId":"u1","reviewStatus":"completed"}"#).unwrap();

        assert_eq!(parsed.applicant_id.as_str(), "u1");
        assert_eq!(parsed.target_status(), VerificationStatus::Completed);
        assert!(parsed.external_user_id.is_none());
    }

    #[test]
    fn parses_full_payload() {
        let body = br#"{
            "applicantId": "5cb56e8e0a975a35f333cb83",
            "inspectionId": "5cb56e8e0a975a35f333cb84",
            "correlationId": "req-a260b669",
            "externalUserId": "user-1.6f2c",
            "levelName": "basic-kyc-level",
            "type": "applicantReviewed",
            "reviewResult": {"reviewAnswer": "RED", "rejectLabels": ["FORGERY"]},
            "reviewStatus": "completed",
            "createdAtMs": "2020-02-21 13:23:19.321"
        }"#;

        let parsed = ParsedCallback::parse(body).unwrap();
        assert_eq!(parsed.external_user_id.as_deref(), Some("user-1.6f2c"));
        assert_eq!(parsed.event_type.as_deref(), Some("applicantReviewed"));
        assert_eq!(parsed.target_status(), VerificationStatus::Rejected);
        assert_eq!(parsed.raw["levelName"], "basic-kyc-level");
    }

    #[test]
    fn rejects_invalid_json() {
        let err = ParsedCallback::parse(b"{not json").unwrap_err();
        assert!(matches!(err, VerificationError::ValidationFailed { .. }));
    }

    #[test]
    fn rejects_non_object() {
        assert!(ParsedCallback::parse(b"[1,2,3]").is_err());
    }

    #[test]
    fn rejects_missing_applicant_id() {
        let err = ParsedCallback::parse(br#"{"reviewStatus":"completed"}"#).unwrap_err();
        assert!(matches!(
            err,
            VerificationError::ValidationFailed { ref field, .. } if field == "applicantId"
        ));
    }

    #[test]
    fn rejects_blank_review_status() {
        let err = ParsedCallback::parse(br#"{"applicantId":"u1","reviewStatus":" "}"#).unwrap_err();
        assert!(matches!(
            err,
            VerificationError::ValidationFailed { ref field, .. } if field == "reviewStatus"
        ));
    }

    #[test]
    fn wrong_field_type_is_a_validation_error() {
        assert!(ParsedCallback::parse(br#"{"applicantId":42,"reviewStatus":"completed"}"#).is_err());
    }

    #[test]
    fn unknown_review_status_targets_pending() {
        let parsed =
            ParsedCallback::parse(br#"{"applicantId":"u1","reviewStatus":"somethingNew"}"#).unwrap();
        assert_eq!(parsed.target_status(), VerificationStatus::Pending);
    }
}
