//! Custom Axum extractors.
//!
//! Session context is passed to handlers explicitly through these.

pub mod session;

pub use session::{AdminSession, MemberSession, SessionAuth};
