//! HTTP middleware for axum.
//!
//! - `api_key` - API key check for client routes

pub mod api_key;

pub use api_key::{require_api_key, ApiKeyState, API_KEY_HEADER};
