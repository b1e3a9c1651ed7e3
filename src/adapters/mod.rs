//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum REST API
//! - `memory` - In-memory repositories for tests and local runs
//! - `postgres` - PostgreSQL repositories
//! - `sumsub` - Verification provider client and mock

pub mod http;
pub mod memory;
pub mod postgres;
pub mod sumsub;
