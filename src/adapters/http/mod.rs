//! HTTP adapters - REST API implementations.

pub mod health;
pub mod middleware;
pub mod verification;

// Re-export key types for convenience
pub use verification::{verification_router, VerificationAppState};
