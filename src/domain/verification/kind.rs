//! Verification kind discriminant.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Which verification flow a session belongs to.
///
/// Stored as an explicit column on every session; identifiers sent to the
/// provider never encode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationKind {
    /// Face liveness detection.
    Liveness,
    /// Identity document plus selfie match.
    Kyc,
}

impl VerificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationKind::Liveness => "liveness",
            VerificationKind::Kyc => "kyc",
        }
    }

    /// Parses the stored representation.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.to_lowercase().as_str() {
            "liveness" => Ok(VerificationKind::Liveness),
            "kyc" => Ok(VerificationKind::Kyc),
            other => Err(ValidationError::invalid_format(
                "kind",
                format!("unknown verification kind '{}'", other),
            )),
        }
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
