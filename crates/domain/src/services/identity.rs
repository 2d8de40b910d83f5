//! Identity provider abstraction.
//!
//! The provider owns user accounts and sessions. The ledger only needs two
//! things from it: resolving a session JWT to a user, and minting a
//! short-lived JWT for a user on the server side.

use std::collections::HashMap;

use thiserror::Error;

/// Authenticated user behind a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub labels: Vec<String>,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            id: id.into(),
            labels,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Errors reported by an identity provider.
#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolve a session JWT to the user it belongs to.
    async fn resolve_session(&self, jwt: &str) -> Result<SessionUser, IdentityError>;

    /// Mint a session JWT for `user_id`.
    async fn mint_jwt(&self, user_id: &str) -> Result<String, IdentityError>;
}

/// In-memory identity provider for tests.
///
/// Sessions are registered up front; minted tokens are `jwt-for-{uid}`.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityService {
    sessions: HashMap<String, SessionUser>,
    /// Whether to simulate provider failures.
    pub simulate_failure: bool,
}

impl MockIdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider whose calls all fail.
    pub fn failing() -> Self {
        Self {
            sessions: HashMap::new(),
            simulate_failure: true,
        }
    }

    /// Register `jwt` as a valid session for `user`.
    pub fn with_session(mut self, jwt: impl Into<String>, user: SessionUser) -> Self {
        self.sessions.insert(jwt.into(), user);
        self
    }
}

#[async_trait::async_trait]
impl IdentityService for MockIdentityService {
    async fn resolve_session(&self, jwt: &str) -> Result<SessionUser, IdentityError> {
        if self.simulate_failure {
            return Err(IdentityError::Unavailable("simulated failure".into()));
        }
        if let Some(user) = self.sessions.get(jwt) {
            return Ok(user.clone());
        }
        // Tokens minted by this mock resolve back to their user.
        jwt.strip_prefix("jwt-for-")
            .filter(|uid| !uid.is_empty())
            .map(|uid| SessionUser::new(uid, Vec::new()))
            .ok_or(IdentityError::InvalidSession)
    }

    async fn mint_jwt(&self, user_id: &str) -> Result<String, IdentityError> {
        if self.simulate_failure {
            tracing::warn!(user_id = %user_id, "Mock identity: simulated mint failure");
            return Err(IdentityError::Unavailable("simulated failure".into()));
        }
        Ok(format!("jwt-for-{}", user_id))
    }
}
