//! Client library for the coffee tab claim exchange.
//!
//! A scanning device holds a [`Session`] for its anonymous identity, created
//! on first use through [`AppwriteAccount`]. The [`ClaimClient`] trades a
//! claim token for the member's credential, either through a direct call to
//! the API or by running the exchange as a hosted function and polling its
//! execution.
//!
//! ```ignore
//! use client::{ClaimClient, ClientConfig, Session};
//!
//! let config = ClientConfig::builder()
//!     .with_api_base_url("https://coffee.example.com")
//!     .with_appwrite_endpoint("https://cloud.appwrite.io/v1")
//!     .with_project_id("coffee")
//!     .build()?;
//! let claims = ClaimClient::direct(config, Session::new())?;
//! let outcome = claims.scan("3f9a...").await?;
//! ```

pub mod account;
pub mod claim;
pub mod config;
pub mod error;
pub mod execution;
pub mod session;

#[cfg(test)]
mod test_server;

pub use account::{AccountUser, AnonymousSession, AppwriteAccount};
pub use claim::{ClaimClient, ClaimOutcome, ClaimTransport};
pub use config::{ClientConfig, ClientConfigBuilder, PollPolicy};
pub use error::{ClientError, Result};
pub use execution::{
    AppwriteExecutionApi, Execution, ExecutionApi, ExecutionPoller, ExecutionStatus,
};
pub use session::Session;
