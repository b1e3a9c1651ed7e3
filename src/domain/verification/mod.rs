//! Verification domain.
//!
//! Sessions tracked against the identity-verification provider, the
//! provider's review vocabulary, and the signing primitives that guard both
//! directions of the provider exchange.

mod artifact;
mod callback;
mod errors;
mod image;
mod kind;
mod review;
mod session;
mod signature;
mod status;
mod user_record;

pub use artifact::{
    Artifact, DocumentDescriptor, DocumentSide, DEFAULT_DOCUMENT_COUNTRY, DEFAULT_DOCUMENT_TYPE,
};
pub use callback::{ParsedCallback, ProviderCallback, ReviewResult};
pub use errors::VerificationError;
pub use image::{decode_image, DecodedImage, ImageFormat};
pub use kind::VerificationKind;
pub use review::{
    map_review_status, resolve_status, ProviderReviewStatus, ReviewAnswer, ReviewOutcome,
};
pub use session::{TransitionPlan, VerificationSession, STEPS_COMPLETED_KEY};
pub use signature::{
    payload_digest, DigestAlgorithm, RequestSigner, SignatureError, SignatureVerifier,
    PAYLOAD_DIGEST_ALG_HEADER, PAYLOAD_DIGEST_HEADER,
};
pub use status::VerificationStatus;
pub use user_record::UserRecord;
