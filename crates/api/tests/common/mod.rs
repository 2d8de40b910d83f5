//! Common test utilities for integration tests.
//!
//! The router runs against the in-memory document store and the local
//! identity provider, so no external services are needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use coffee_tab_api::{app::create_app, config::Config, services::LocalIdentityService};
use domain::models::{Claim, Member};
use domain::services::IdentityService;
use fake::faker::name::en::Name;
use fake::Fake;
use persistence::db::{Backends, Repositories};
use persistence::memory::MemoryStore;
use persistence::storage::MemoryFileStorage;
use persistence::store::DocumentStore;
use serde_json::Value;
use tower::ServiceExt;

/// Uid the test configuration grants the admin label.
pub const ADMIN_UID: &str = "admin-uid";

/// Test configuration: memory store, local identity, no rate limiting.
pub fn test_config() -> Config {
    Config::load_for_test(&[]).expect("Failed to load test config")
}

/// A router plus direct handles on its backing state.
pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub files: Arc<MemoryFileStorage>,
    identity: Arc<LocalIdentityService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let files = Arc::new(MemoryFileStorage::new());
        let identity = Arc::new(
            LocalIdentityService::from_config(&config).expect("Invalid test JWT settings"),
        );
        let repos = Repositories::new(store.clone(), &config.collections());

        let backends = Backends {
            store,
            files: files.clone(),
            appwrite: None,
        };
        let router = create_app(config, backends, identity.clone());

        Self {
            router,
            repos,
            files,
            identity,
        }
    }

    /// Session JWT for `uid`, as the identity provider would issue it.
    pub async fn session_for(&self, uid: &str) -> String {
        self.identity.mint_jwt(uid).await.expect("Failed to mint test JWT")
    }

    pub async fn admin_session(&self) -> String {
        self.session_for(ADMIN_UID).await
    }

    /// Create a member with a generated name.
    pub async fn seed_member(&self, id: &str) -> Member {
        let name: String = Name().fake();
        self.repos
            .members
            .create(id, &name)
            .await
            .expect("Failed to seed member")
    }

    /// Create a member already linked to `uid`.
    pub async fn seed_linked_member(&self, id: &str, uid: &str) -> Member {
        self.seed_member(id).await;
        self.repos
            .members
            .set_appwrite_uid(id, uid)
            .await
            .expect("Failed to link member")
    }

    pub async fn seed_claim(&self, token: &str, member_id: &str, created_at: DateTime<Utc>) {
        self.repos
            .claims
            .create(&Claim::new(
                token.to_string(),
                member_id.to_string(),
                created_at,
                domain::models::CLAIM_TTL_SECS,
            ))
            .await
            .expect("Failed to seed claim");
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a request and parse the JSON body (Null when empty).
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        (status, parse_response_body(response).await)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a JSON request, optionally with a session token.
pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header("X-Appwrite-JWT", token);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request with a Bearer session token.
pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Compare euro amounts to the cent.
pub fn assert_eur(actual: &Value, expected: f64) {
    let actual = actual.as_f64().expect("amount is not a number");
    assert!(
        (actual - expected).abs() < 0.005,
        "expected {}, got {}",
        expected,
        actual
    );
}
