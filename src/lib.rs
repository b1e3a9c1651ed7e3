//! Biometric Gateway - Liveness and KYC verification backend
//!
//! This crate forwards liveness and identity-document verification to a
//! third-party provider, tracks each attempt as a session in PostgreSQL and
//! reconciles session state from signed provider callbacks.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
