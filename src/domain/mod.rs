//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `verification` - Verification sessions, review mapping, signatures and callbacks

pub mod foundation;
pub mod verification;
