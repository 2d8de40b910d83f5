//! Identity providers.
//!
//! [`AppwriteIdentityService`] talks to the hosted account service.
//! [`LocalIdentityService`] signs its own HS256 tokens, for self-hosting
//! and tests.

use std::collections::HashSet;
use std::sync::Arc;

use domain::services::{IdentityError, IdentityService, SessionUser};
use persistence::appwrite::AppwriteClient;
use persistence::store::StoreError;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use shared::jwt::{JwtConfig, JwtError};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, ConfigValidationError, IdentityProvider};

#[derive(Debug, Error)]
pub enum IdentitySetupError {
    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    #[error("Failed to create Appwrite client: {0}")]
    Client(#[from] StoreError),

    #[error("Invalid JWT settings: {0}")]
    Jwt(#[from] JwtError),
}

#[derive(Debug, Deserialize)]
struct Account {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MintedJwt {
    jwt: String,
}

/// Identity backed by the Appwrite account and users APIs.
#[derive(Clone)]
pub struct AppwriteIdentityService {
    client: AppwriteClient,
}

impl AppwriteIdentityService {
    pub fn new(client: AppwriteClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl IdentityService for AppwriteIdentityService {
    async fn resolve_session(&self, jwt: &str) -> Result<SessionUser, IdentityError> {
        let request = self.client.session_request(Method::GET, "/account", jwt);
        let account: Account = self
            .client
            .send_json(request)
            .await
            .map_err(|e| match e {
                StoreError::NotFound | StoreError::Api { status: 401, .. } => {
                    IdentityError::InvalidSession
                }
                other => IdentityError::Unavailable(other.to_string()),
            })?;
        Ok(SessionUser::new(account.id, account.labels))
    }

    async fn mint_jwt(&self, user_id: &str) -> Result<String, IdentityError> {
        let request = self
            .client
            .request(Method::POST, &format!("/users/{}/jwts", user_id))
            .json(&json!({}));
        let minted: MintedJwt = self.client.send_json(request).await.map_err(|e| match e {
            StoreError::NotFound => IdentityError::UnknownUser(user_id.to_string()),
            other => IdentityError::Unavailable(other.to_string()),
        })?;
        debug!(user_id = %user_id, "Minted provider JWT");
        Ok(minted.jwt)
    }
}

/// Identity with locally signed tokens.
///
/// Users listed in `admin_uids` carry the admin label.
#[derive(Debug, Clone)]
pub struct LocalIdentityService {
    jwt: JwtConfig,
    admin_label: String,
    admin_uids: HashSet<String>,
}

impl LocalIdentityService {
    pub fn new(jwt: JwtConfig, admin_label: impl Into<String>, admin_uids: &[String]) -> Self {
        Self {
            jwt,
            admin_label: admin_label.into(),
            admin_uids: admin_uids.iter().cloned().collect(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, JwtError> {
        let jwt = JwtConfig::new(&config.identity.jwt_secret, config.identity.jwt_expiry_secs)?;
        Ok(Self::new(
            jwt,
            config.identity.admin_label.clone(),
            &config.identity.admin_uids,
        ))
    }

    fn labels_for(&self, user_id: &str) -> Vec<String> {
        if self.admin_uids.contains(user_id) {
            vec![self.admin_label.clone()]
        } else {
            Vec::new()
        }
    }
}

#[async_trait::async_trait]
impl IdentityService for LocalIdentityService {
    async fn resolve_session(&self, jwt: &str) -> Result<SessionUser, IdentityError> {
        let claims = self.jwt.validate_token(jwt).map_err(|e| {
            debug!(error = %e, "Rejected local session token");
            IdentityError::InvalidSession
        })?;

        let mut labels = claims.labels;
        for label in self.labels_for(&claims.sub) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        Ok(SessionUser::new(claims.sub, labels))
    }

    async fn mint_jwt(&self, user_id: &str) -> Result<String, IdentityError> {
        if user_id.trim().is_empty() {
            return Err(IdentityError::UnknownUser(user_id.to_string()));
        }
        self.jwt
            .generate_token(user_id, &self.labels_for(user_id))
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }
}

/// Build the configured identity provider.
///
/// The Appwrite provider reuses the store's client when there is one.
pub fn create_identity_service(
    config: &Config,
    appwrite: Option<&AppwriteClient>,
) -> Result<Arc<dyn IdentityService>, IdentitySetupError> {
    match config.identity_provider()? {
        IdentityProvider::Appwrite => {
            let client = match appwrite {
                Some(client) => client.clone(),
                None => AppwriteClient::new(&config.appwrite_settings())?,
            };
            info!(endpoint = %client.endpoint(), "Using Appwrite identity provider");
            Ok(Arc::new(AppwriteIdentityService::new(client)))
        }
        IdentityProvider::Local => {
            info!(
                admins = config.identity.admin_uids.len(),
                "Using local identity provider"
            );
            Ok(Arc::new(LocalIdentityService::from_config(config)?))
        }
    }
}
