//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSessionRepository` - Verification sessions with JSONB metadata
//! - `PostgresUserRepository` - Per-user verification summaries

mod session_repository;
mod user_repository;

pub use session_repository::PostgresSessionRepository;
pub use user_repository::PostgresUserRepository;
