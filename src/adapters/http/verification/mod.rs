//! HTTP adapter for verification endpoints.
//!
//! Exposes liveness and KYC sessions via REST API under `/api/v1`, plus the
//! provider callback endpoint. See [`routes`] for the full route table.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::ErrorResponse;
pub use handlers::{VerificationApiError, VerificationAppState};
pub use routes::{client_routes, verification_router, webhook_routes};
