//! Rate limiting middleware.
//!
//! Limits claim exchanges per client address, so claim tokens cannot be
//! brute-forced from one client. The client is the socket peer; proxy
//! headers are only honoured when `security.trust_proxy_headers` is set.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter as GovRateLimiter,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::app::AppState;
use crate::error::ApiError;

/// Key used when neither a peer address nor a trusted header is available.
const UNKNOWN_CLIENT: &str = "unknown";

/// Drop idle client entries every this many checks.
const RETAIN_EVERY: u64 = 1024;

/// Rate limiter state shared across all requests.
pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<String>,
    checks: AtomicU64,
    trust_proxy_headers: bool,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// Create a limiter allowing `rate_limit_per_minute` requests per client.
    ///
    /// Returns `None` when the limit is 0 (disabled).
    pub fn new(rate_limit_per_minute: u32, trust_proxy_headers: bool) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: GovRateLimiter::keyed(Quota::per_minute(per_minute)),
            checks: AtomicU64::new(0),
            trust_proxy_headers,
            rate_limit_per_minute,
        })
    }

    /// Check if a request from `key` should be allowed.
    /// Returns Err with retry-after seconds when limited.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % RETAIN_EVERY == RETAIN_EVERY - 1 {
            self.limiter.retain_recent();
            self.limiter.shrink_to_fit();
        }

        self.limiter.check_key(&key.to_string()).map_err(|not_until| {
            let wait_time = not_until.wait_time_from(DefaultClock::default().now());
            wait_time.as_secs().max(1)
        })
    }

    /// Number of clients currently tracked.
    pub fn active_clients(&self) -> usize {
        self.limiter.len()
    }

    /// Client key for a request: a trusted proxy header when enabled,
    /// otherwise the peer IP.
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> String {
        let forwarded = if self.trust_proxy_headers {
            forwarded_client(headers)
        } else {
            None
        };

        forwarded
            .or_else(|| peer.map(|ip| ip.to_string()))
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .field("active_clients", &self.active_clients())
            .finish()
    }
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`. Values that are not IP
/// addresses are ignored.
fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());

    let real_ip = || headers.get("x-real-ip").and_then(|v| v.to_str().ok());

    forwarded
        .and_then(parse_ip)
        .or_else(|| real_ip().and_then(parse_ip))
        .map(|ip| ip.to_string())
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

/// Middleware that applies the per-client limit.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ref rate_limiter) = state.rate_limiter {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let key = rate_limiter.client_key(req.headers(), peer);
        if let Err(retry_after_secs) = rate_limiter.check(&key) {
            tracing::warn!(client = %key, retry_after_secs, "Rate limit exceeded");
            return ApiError::RateLimited { retry_after_secs }.into_response();
        }
    }

    next.run(req).await
}
