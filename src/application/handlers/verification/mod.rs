//! Verification handlers.
//!
//! Command and query handlers for liveness and KYC sessions:
//!
//! ## Commands
//! - Starting sessions
//! - Submitting selfies and document sides
//! - Refreshing and completing sessions against the provider
//! - Processing provider callbacks
//! - Issuing SDK access tokens
//!
//! ## Queries
//! - Get a user's verification summary

mod complete_session;
mod create_access_token;
mod get_user_status;
mod handle_provider_callback;
mod levels;
mod refresh_session;
mod start_session;
mod submit_artifact;
mod transitions;

pub use levels::VerificationLevels;
pub use transitions::{SessionTransitions, TransitionOutcome};

// Commands
pub use complete_session::{CompleteSessionCommand, CompleteSessionHandler, CompleteSessionResult};
pub use create_access_token::{
    CreateAccessTokenCommand, CreateAccessTokenHandler, CreateAccessTokenResult,
};
pub use handle_provider_callback::{
    CallbackDisposition, HandleProviderCallbackCommand, HandleProviderCallbackHandler,
    HandleProviderCallbackResult,
};
pub use refresh_session::{RefreshSessionCommand, RefreshSessionHandler, RefreshSessionResult};
pub use start_session::{StartSessionCommand, StartSessionHandler, StartSessionResult};
pub use submit_artifact::{SubmitArtifactCommand, SubmitArtifactHandler, SubmitArtifactResult};

// Queries
pub use get_user_status::{GetUserStatusHandler, GetUserStatusQuery, KindSummary, UserStatusResult};
