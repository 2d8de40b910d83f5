//! Client-side session state.

use std::sync::Arc;

use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct SessionState {
    jwt: Option<String>,
    user_id: Option<String>,
}

/// The identity credential the client currently acts under.
///
/// Clones share the same slot, so a credential applied after a claim
/// exchange is seen by every holder.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    /// A session with no credential.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jwt(jwt: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState {
                jwt: Some(jwt.into()),
                user_id: None,
            })),
        }
    }

    pub async fn jwt(&self) -> Option<String> {
        self.state.read().await.jwt.clone()
    }

    /// Identity-provider user the credential belongs to, once known.
    pub async fn user_id(&self) -> Option<String> {
        self.state.read().await.user_id.clone()
    }

    /// Replace the credential. The user becomes unknown until resolved.
    pub async fn set_jwt(&self, jwt: impl Into<String>) {
        let mut state = self.state.write().await;
        state.jwt = Some(jwt.into());
        state.user_id = None;
    }

    /// Set the credential together with the user it belongs to.
    pub async fn set_identity(&self, user_id: impl Into<String>, jwt: impl Into<String>) {
        let mut state = self.state.write().await;
        state.jwt = Some(jwt.into());
        state.user_id = Some(user_id.into());
    }

    pub(crate) async fn set_user_id(&self, user_id: impl Into<String>) {
        self.state.write().await.user_id = Some(user_id.into());
    }

    pub async fn clear(&self) {
        *self.state.write().await = SessionState::default();
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.jwt.is_some()
    }
}
