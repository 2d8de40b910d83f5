//! Persistence layer for the coffee tab.
//!
//! This crate contains:
//! - The document store abstraction and its Appwrite and in-memory backends
//! - Receipt file storage
//! - Entity definitions (document mappings)
//! - Repository implementations

pub mod appwrite;
pub mod db;
pub mod entities;
pub mod memory;
pub mod metrics;
pub mod repositories;
pub mod storage;
pub mod store;
