//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `VerificationProvider` - Remote identity-verification service
//! - `SessionRepository` - Verification session persistence
//! - `UserRepository` - Per-user verification summaries

mod session_repository;
mod user_repository;
mod verification_provider;

pub use session_repository::{SessionRepository, SessionUpdate, UpdateOutcome};
pub use user_repository::UserRepository;
pub use verification_provider::{
    AccessToken, Applicant, ApplicantReview, CreateApplicantRequest, ProviderError,
    ProviderErrorCode, UploadedArtifact, VerificationProvider,
};
