//! Device identity bootstrap against Appwrite's account API.
//!
//! A device that has never scanned a code still needs an identity to link.
//! [`AppwriteAccount::init_session`] keeps a working session and otherwise
//! creates an anonymous one, then exchanges it for a JWT the API accepts.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{check_status, ClientError, Result};
use crate::session::Session;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const JWT_HEADER: &str = "X-Appwrite-JWT";
/// Carries session cookies for clients without a cookie jar.
const FALLBACK_COOKIES_HEADER: &str = "X-Fallback-Cookies";

/// The account behind a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountUser {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct JwtBody {
    jwt: String,
}

/// A freshly created anonymous session.
#[derive(Debug, Clone)]
pub struct AnonymousSession {
    pub user_id: String,
    fallback_cookies: Option<String>,
}

#[derive(Clone)]
pub struct AppwriteAccount {
    http: Client,
    endpoint: String,
    project_id: String,
}

impl AppwriteAccount {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.endpoint, path))
            .header(PROJECT_HEADER, &self.project_id)
    }

    /// The user owning `jwt`, `None` when the JWT is no longer accepted.
    pub async fn current_user(&self, jwt: &str) -> Result<Option<AccountUser>> {
        let response = self
            .request(Method::GET, "/account")
            .header(JWT_HEADER, jwt)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let bytes = check_status(response).await?.bytes().await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// `POST /account/sessions/anonymous`.
    pub async fn create_anonymous_session(&self) -> Result<AnonymousSession> {
        let response = self
            .request(Method::POST, "/account/sessions/anonymous")
            .send()
            .await?;
        let response = check_status(response).await?;
        let fallback_cookies = response
            .headers()
            .get(FALLBACK_COOKIES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        let body: SessionBody = serde_json::from_slice(&bytes)?;
        Ok(AnonymousSession {
            user_id: body.user_id,
            fallback_cookies,
        })
    }

    /// `POST /account/jwts` on behalf of `session`.
    pub async fn create_jwt(&self, session: &AnonymousSession) -> Result<String> {
        let cookies = session.fallback_cookies.as_deref().ok_or_else(|| {
            ClientError::Config("anonymous session returned no session cookie".into())
        })?;
        let response = self
            .request(Method::POST, "/account/jwts")
            .header(FALLBACK_COOKIES_HEADER, cookies)
            .send()
            .await?;
        let bytes = check_status(response).await?.bytes().await?;
        let body: JwtBody = serde_json::from_slice(&bytes)?;
        Ok(body.jwt)
    }

    /// Make sure `session` holds a working credential and return its user.
    ///
    /// An accepted JWT is kept as is; otherwise an anonymous session is
    /// created and its JWT applied.
    pub async fn init_session(&self, session: &Session) -> Result<String> {
        if let Some(jwt) = session.jwt().await {
            if let Some(user) = self.current_user(&jwt).await? {
                debug!(user_id = %user.id, "Existing session is valid");
                session.set_user_id(user.id.clone()).await;
                return Ok(user.id);
            }
            debug!("Stored session was rejected; starting an anonymous one");
        }

        let anonymous = self.create_anonymous_session().await?;
        let jwt = self.create_jwt(&anonymous).await?;
        session.set_identity(anonymous.user_id.clone(), jwt).await;
        info!(user_id = %anonymous.user_id, "Created anonymous session");
        Ok(anonymous.user_id)
    }
}
