//! Sumsub verification provider adapter.
//!
//! Implements the `VerificationProvider` port for Sumsub, including:
//! - Applicant creation under a verification level
//! - Selfie and identity document uploads
//! - Review status lookups
//! - SDK access tokens
//!
//! # Security
//!
//! - Requests are signed with HMAC-SHA256 (`X-App-Access-Sig`)
//! - All secrets are handled via `secrecy::SecretString`

mod api_types;
mod mock_provider;
mod sumsub_adapter;

pub use api_types::{SumsubAccessToken, SumsubApplicant, SumsubReview, SumsubReviewResult};
pub use mock_provider::{MethodCall, MockVerificationProvider};
pub use sumsub_adapter::{SumsubAdapter, SumsubConfig, DEFAULT_BASE_URL};
