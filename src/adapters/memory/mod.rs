//! In-memory adapters for tests and local development.
//!
//! - `InMemorySessionRepository` - Sessions with the same uniqueness rules as
//!   the PostgreSQL schema
//! - `InMemoryUserRepository` - Per-user summaries

mod session_repository;
mod user_repository;

pub use session_repository::InMemorySessionRepository;
pub use user_repository::InMemoryUserRepository;
