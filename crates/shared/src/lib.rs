//! Shared utilities and common types for the coffee tab backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Token and document id generation, hashing
//! - Currency arithmetic in whole cents
//! - Locally signed session JWTs
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod money;
pub mod validation;
