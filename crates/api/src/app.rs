use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::IdentityService;
use persistence::db::{Backends, Repositories};
use persistence::storage::FileStorage;
use persistence::store::DocumentStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{admin, analytics, claims, global_config, health, logs, members, receipts};
use crate::services::{ClaimService, LedgerService};

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub store: Arc<dyn DocumentStore>,
    pub files: Arc<dyn FileStorage>,
    pub identity: Arc<dyn IdentityService>,
    pub claims: ClaimService,
    pub ledger: LedgerService,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends, identity: Arc<dyn IdentityService>) -> Self {
        let config = Arc::new(config);
        let repos = Repositories::new(backends.store.clone(), &config.collections());

        let claims = ClaimService::new(
            repos.claims.clone(),
            repos.members.clone(),
            identity.clone(),
            config.claims.ttl_secs,
            config.claims.app_base_url.clone(),
        );
        let ledger = LedgerService::new(repos.clone(), backends.files.clone());

        // None when rate_limit_per_minute is 0
        let rate_limiter =
            RateLimiterState::new(
                config.security.rate_limit_per_minute,
                config.security.trust_proxy_headers,
            )
            .map(Arc::new);

        Self {
            repos,
            store: backends.store,
            files: backends.files,
            identity,
            claims,
            ledger,
            config,
            rate_limiter,
        }
    }
}

pub fn create_app(config: Config, backends: Backends, identity: Arc<dyn IdentityService>) -> Router {
    let state = AppState::new(config, backends, identity);
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public and rate limited: the token is the only credential.
    let claim_routes = Router::new()
        .route("/api/v1/claims/exchange", post(claims::exchange_claim))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Session routes; the extractors resolve the caller.
    let session_routes = Router::new()
        .route("/api/v1/members/me", get(members::get_me))
        .route("/api/v1/members/me/coffee", post(members::register_coffee))
        .route("/api/v1/config", get(global_config::get_config))
        .route("/api/v1/logs", get(logs::recent_logs))
        .route("/api/v1/logs/group", get(logs::group_logs))
        .route("/api/v1/analytics", get(analytics::get_analytics))
        .route("/api/v1/receipts/:file_id", get(receipts::receipt_url));

    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/members",
            get(admin::list_members).post(admin::create_member),
        )
        .route(
            "/api/v1/admin/members/:member_id/claims",
            post(claims::issue_claim),
        )
        .route(
            "/api/v1/admin/members/:member_id/top-ups",
            post(admin::top_up),
        )
        .route("/api/v1/admin/expenses", post(admin::record_expense))
        .route(
            "/api/v1/admin/bean-purchases",
            post(admin::record_bean_purchase),
        )
        .route(
            "/api/v1/admin/config/grams-per-cup",
            put(admin::update_grams_per_cup),
        )
        .route(
            "/api/v1/admin/config/surcharge",
            put(admin::update_surcharge),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(claim_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .merge(public_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
