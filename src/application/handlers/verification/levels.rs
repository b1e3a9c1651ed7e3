//! Provider verification levels per session kind.

use crate::domain::verification::VerificationKind;

/// Provider level names used when creating applicants and SDK tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationLevels {
    pub liveness: String,
    pub kyc: String,
}

impl VerificationLevels {
    pub fn new(liveness: impl Into<String>, kyc: impl Into<String>) -> Self {
        Self {
            liveness: liveness.into(),
            kyc: kyc.into(),
        }
    }

    pub fn for_kind(&self, kind: VerificationKind) -> &str {
        match kind {
            VerificationKind::Liveness => &self.liveness,
            VerificationKind::Kyc => &self.kyc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_kind_selects_level() {
        let levels = VerificationLevels::new("liveness-only", "basic-kyc-level");
        assert_eq!(levels.for_kind(VerificationKind::Liveness), "liveness-only");
        assert_eq!(levels.for_kind(VerificationKind::Kyc), "basic-kyc-level");
    }
}
