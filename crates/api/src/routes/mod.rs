//! HTTP route handlers.

pub mod admin;
pub mod analytics;
pub mod claims;
pub mod global_config;
pub mod health;
pub mod logs;
pub mod members;
pub mod receipts;
