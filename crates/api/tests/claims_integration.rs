//! Integration tests for claim issuance and exchange.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, Utc};
use common::{get_request_with_auth, json_request, test_config, TestApp};
use serde_json::json;

const EXCHANGE: &str = "/api/v1/claims/exchange";

// ============================================================================
// Exchange
// ============================================================================

#[tokio::test]
async fn test_first_scan_links_member_and_authenticates() {
    let app = TestApp::new();
    app.seed_member("M1").await;
    app.seed_claim("T1", "M1", Utc::now()).await;

    let (status, body) = app
        .call(json_request(
            Method::POST,
            EXCHANGE,
            json!({ "token": "T1", "scannerUid": "U1" }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["linked"], true);
    assert_eq!(body["memberId"], "M1");
    assert_eq!(body["appwrite_uid"], "U1");
    let jwt = body["jwt"].as_str().expect("jwt missing").to_string();

    let member = app.repos.members.find("M1").await.unwrap().unwrap();
    assert_eq!(member.appwrite_uid.as_deref(), Some("U1"));
    assert!(app.repos.claims.find("T1").await.unwrap().is_none());

    // The minted credential is a working session for the member.
    let (status, me) = app
        .call(get_request_with_auth("/api/v1/members/me", &jwt))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], "M1");
}

#[tokio::test]
async fn test_linked_member_keeps_canonical_identity() {
    let app = TestApp::new();
    app.seed_linked_member("M1", "U1").await;
    app.seed_claim("T1", "M1", Utc::now()).await;

    let (status, body) = app
        .call(json_request(
            Method::POST,
            EXCHANGE,
            json!({ "token": "T1", "scannerUid": "U2" }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["linked"], true);
    assert_eq!(body["appwrite_uid"], "U1");
    let member = app.repos.members.find("M1").await.unwrap().unwrap();
    assert_eq!(member.appwrite_uid.as_deref(), Some("U1"));
}

#[tokio::test]
async fn test_exchange_without_scanner() {
    let app = TestApp::new();
    app.seed_linked_member("M1", "U1").await;
    app.seed_claim("T1", "M1", Utc::now()).await;

    let (status, body) = app
        .call(json_request(Method::POST, EXCHANGE, json!({ "token": "T1" }), None))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("linked").is_none());
    assert_eq!(body["memberId"], "M1");
    assert!(body["jwt"].is_string());
}

#[tokio::test]
async fn test_expired_token_is_rejected_and_deleted() {
    let app = TestApp::new();
    app.seed_member("M1").await;
    app.seed_claim("T1", "M1", Utc::now() - Duration::minutes(6)).await;

    let (status, body) = app
        .call(json_request(
            Method::POST,
            EXCHANGE,
            json!({ "token": "T1", "scannerUid": "U1" }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "token expired");
    assert!(app.repos.claims.find("T1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_member_keeps_claim() {
    let app = TestApp::new();
    app.seed_claim("T1", "ghost", Utc::now()).await;

    let (status, body) = app
        .call(json_request(Method::POST, EXCHANGE, json!({ "token": "T1" }), None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no linked user");
    assert!(app.repos.claims.find("T1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_consumed_token_is_invalid() {
    let app = TestApp::new();
    app.seed_member("M1").await;
    app.seed_claim("T1", "M1", Utc::now()).await;

    let payload = json!({ "token": "T1", "scannerUid": "U1" });
    let (status, _) = app
        .call(json_request(Method::POST, EXCHANGE, payload.clone(), None))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(json_request(Method::POST, EXCHANGE, payload, None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid token");
}

#[tokio::test]
async fn test_missing_token() {
    let app = TestApp::new();

    let (status, body) = app
        .call(json_request(Method::POST, EXCHANGE, json!({}), None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing token");

    let (status, body) = app
        .call(json_request(Method::POST, EXCHANGE, json!({ "token": "" }), None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing token");
}

fn raw_exchange(content_type: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(EXCHANGE);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_empty_body_is_missing_token() {
    let app = TestApp::new();

    for request in [
        raw_exchange(None, ""),
        raw_exchange(Some("application/json"), ""),
        raw_exchange(Some("text/plain"), "  "),
    ] {
        let (status, body) = app.call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing token");
    }
}

#[tokio::test]
async fn test_json_body_without_content_type() {
    let app = TestApp::new();
    app.seed_linked_member("M1", "U1").await;
    app.seed_claim("T1", "M1", Utc::now()).await;

    let (status, body) = app
        .call(raw_exchange(None, r#"{"token":"T1"}"#))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["memberId"], "M1");
}

#[tokio::test]
async fn test_unknown_fields_rejected() {
    let app = TestApp::new();
    app.seed_member("M1").await;
    app.seed_claim("T1", "M1", Utc::now()).await;

    let (status, body) = app
        .call(json_request(
            Method::POST,
            EXCHANGE,
            json!({ "token": "T1", "payload": { "scannerUid": "U1" } }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation error");
    // Rejected before lookup, so the claim is still usable.
    assert!(app.repos.claims.find("T1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_exchange_rate_limited() {
    let config = rate_limited_config();
    let app = TestApp::with_config(config);

    let request = || {
        let mut req = json_request(Method::POST, EXCHANGE, json!({ "token": "nope" }), None);
        req.headers_mut()
            .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
        req
    };

    let (status, _) = app.call(request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app.send(request()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn test_spoofed_forwarded_for_does_not_reset_limit() {
    let app = TestApp::with_config(rate_limited_config());

    let spoofed = |addr: &str| {
        let mut req = json_request(Method::POST, EXCHANGE, json!({ "token": "nope" }), None);
        req.headers_mut()
            .insert("x-forwarded-for", addr.parse().unwrap());
        req
    };

    let (status, _) = app.call(spoofed("203.0.113.1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for addr in ["203.0.113.2", "203.0.113.3", "198.51.100.77"] {
        let response = app.send(spoofed(addr)).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

fn rate_limited_config() -> coffee_tab_api::config::Config {
    let mut config = test_config();
    config.security.rate_limit_per_minute = 1;
    config
}

// ============================================================================
// Issuance
// ============================================================================

#[tokio::test]
async fn test_admin_issues_claim() {
    let app = TestApp::new();
    app.seed_member("M1").await;
    let admin = app.admin_session().await;

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/v1/admin/members/M1/claims",
            json!({}),
            Some(&admin),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["memberId"], "M1");
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), 32);
    assert_eq!(
        body["claimUrl"],
        format!("https://coffee.example.com/?claim={}", token)
    );

    // The issued token exchanges like any other.
    let (status, body) = app
        .call(json_request(
            Method::POST,
            EXCHANGE,
            json!({ "token": token, "scannerUid": "U9" }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appwrite_uid"], "U9");
}

#[tokio::test]
async fn test_issue_claim_requires_admin() {
    let app = TestApp::new();
    app.seed_member("M1").await;
    let user = app.session_for("U1").await;

    let (status, _) = app
        .call(json_request(
            Method::POST,
            "/api/v1/admin/members/M1/claims",
            json!({}),
            Some(&user),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(json_request(
            Method::POST,
            "/api/v1/admin/members/M1/claims",
            json!({}),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_issue_claim_unknown_member() {
    let app = TestApp::new();
    let admin = app.admin_session().await;

    let (status, _) = app
        .call(json_request(
            Method::POST,
            "/api/v1/admin/members/ghost/claims",
            json!({}),
            Some(&admin),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
