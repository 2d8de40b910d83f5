//! Domain layer for the coffee tab backend.
//!
//! This crate contains:
//! - Domain models (Member, Claim, LogEntry, GlobalConfig)
//! - Pricing and analytics logic
//! - The identity service abstraction
pub mod models;
pub mod services;
