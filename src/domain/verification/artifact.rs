//! Artifacts a client submits for verification.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

use super::kind::VerificationKind;

pub const DEFAULT_DOCUMENT_TYPE: &str = "PASSPORT";
pub const DEFAULT_DOCUMENT_COUNTRY: &str = "USA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSide {
    Front,
    Back,
}

impl DocumentSide {
    /// Provider's sub-type name for this side.
    pub fn provider_sub_type(&self) -> &'static str {
        match self {
            DocumentSide::Front => "FRONT_SIDE",
            DocumentSide::Back => "BACK_SIDE",
        }
    }
}

/// Identity document type and issuing country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub doc_type: String,
    /// ISO 3166-1 alpha-3 country code.
    pub country: String,
}

impl DocumentDescriptor {
    /// Builds a descriptor, defaulting to a US passport.
    pub fn new(doc_type: Option<&str>, country: Option<&str>) -> Result<Self, ValidationError> {
        let doc_type = doc_type
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_DOCUMENT_TYPE)
            .to_uppercase();
        if !doc_type.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ValidationError::invalid_format(
                "document_type",
                "only letters, digits and underscores are allowed",
            ));
        }

        let country = country
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_DOCUMENT_COUNTRY)
            .to_uppercase();
        if country.len() != 3 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "country",
                "expected a three-letter country code",
            ));
        }

        Ok(Self { doc_type, country })
    }
}

/// An image-bearing artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Selfie,
    Document {
        side: DocumentSide,
        descriptor: DocumentDescriptor,
    },
}

impl Artifact {
    /// Documents belong to KYC only; selfies are accepted by both flows.
    pub fn allowed_for(&self, kind: VerificationKind) -> bool {
        match self {
            Artifact::Selfie => true,
            Artifact::Document { .. } => kind == VerificationKind::Kyc,
        }
    }

    /// Step name recorded in session metadata.
    pub fn step_name(&self) -> &'static str {
        match self {
            Artifact::Selfie => "selfie",
            Artifact::Document {
                side: DocumentSide::Front,
                ..
            } => "document_front",
            Artifact::Document {
                side: DocumentSide::Back,
                ..
            } => "document_back",
        }
    }

    /// Metadata key under which the provider's image id is stored.
    pub fn image_id_key(&self) -> String {
        format!("{}_image_id", self.step_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults_to_us_passport() {
        let d = DocumentDescriptor::new(None, Some("  ")).unwrap();
        assert_eq!(d.doc_type, "PASSPORT");
        assert_eq!(d.country, "USA");
    }

    #[test]
    fn descriptor_normalises_case() {
        let d = DocumentDescriptor::new(Some("id_card"), Some("deu")).unwrap();
        assert_eq!(d.doc_type, "ID_CARD");
        assert_eq!(d.country, "DEU");
    }

    #[test]
    fn descriptor_rejects_bad_country() {
        assert!(DocumentDescriptor::new(None, Some("US")).is_err());
        assert!(DocumentDescriptor::new(None, Some("U5A")).is_err());
    }

    #[test]
    fn descriptor_rejects_bad_doc_type() {
        let err = DocumentDescriptor::new(Some("ID CARD"), None).unwrap_err();
        assert_eq!(err.field(), "document_type");
    }

    #[test]
    fn documents_are_kyc_only() {
        let doc = Artifact::Document {
            side: DocumentSide::Front,
            descriptor: DocumentDescriptor::new(None, None).unwrap(),
        };
        assert!(doc.allowed_for(VerificationKind::Kyc));
        assert!(!doc.allowed_for(VerificationKind::Liveness));
        assert!(Artifact::Selfie.allowed_for(VerificationKind::Liveness));
    }

    #[test]
    fn step_names_and_keys() {
        let back = Artifact::Document {
            side: DocumentSide::Back,
            descriptor: DocumentDescriptor::new(None, None).unwrap(),
        };
        assert_eq!(back.step_name(), "document_back");
        assert_eq!(back.image_id_key(), "document_back_image_id");
        assert_eq!(DocumentSide::Back.provider_sub_type(), "BACK_SIDE");
        assert_eq!(Artifact::Selfie.image_id_key(), "selfie_image_id");
    }
}
