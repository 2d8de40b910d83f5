//! Repository implementations over a [`crate::store::DocumentStore`].

pub mod claim;
pub mod global_config;
pub mod log;
pub mod member;

pub use claim::ClaimRepository;
pub use global_config::GlobalConfigRepository;
pub use log::LogRepository;
pub use member::MemberRepository;
