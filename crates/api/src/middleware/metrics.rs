//! Prometheus metrics.
//!
//! HTTP request metrics plus counters for claim exchanges and ledger writes,
//! all under the `coffee_tab_` prefix.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const HTTP_REQUESTS: &str = "coffee_tab_http_requests_total";
const HTTP_DURATION: &str = "coffee_tab_http_request_duration_seconds";
const CLAIM_EXCHANGES: &str = "coffee_tab_claim_exchanges_total";
const LEDGER_OPERATIONS: &str = "coffee_tab_ledger_operations_total";

/// Record request count (method, path, status) and latency (method, path).
///
/// Paths are the matched route templates so member ids do not explode the
/// label set.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = method_to_str(req.method());
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    counter!(
        HTTP_REQUESTS,
        "method" => method,
        "path" => path.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);

    histogram!(
        HTTP_DURATION,
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Methods the router serves; anything else is folded into `OTHER`.
fn method_to_str(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

/// Count a claim exchange by outcome (`authenticated`, `linked`,
/// `invalid_token`, ...).
pub fn record_claim_exchange(outcome: &'static str) {
    counter!(CLAIM_EXCHANGES, "outcome" => outcome).increment(1);
}

/// Count a ledger mutation by kind.
pub fn record_ledger_operation(kind: &'static str) {
    counter!(LEDGER_OPERATIONS, "kind" => kind).increment(1);
}

/// Handler for /metrics endpoint that returns Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            [(axum::http::header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

/// Install the global Prometheus recorder.
///
/// Call once at startup, before any metrics are recorded. Later calls are
/// no-ops.
pub fn init_metrics() -> Result<(), BuildError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0])?
        .install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle);
    Ok(())
}
