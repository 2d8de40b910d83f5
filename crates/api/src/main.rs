use std::net::SocketAddr;

use anyhow::Result;
use tracing::info;

use coffee_tab_api::{app, config, middleware, services};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);

    info!("Starting Coffee Tab API v{}", env!("CARGO_PKG_VERSION"));

    middleware::init_metrics()?;

    let backends = persistence::db::create_backends(&config.store_config()?)?;
    info!(backend = %config.store.backend, "Document store ready");

    let identity = services::create_identity_service(&config, backends.appwrite.as_ref())?;

    let addr = config.socket_addr()?;
    let app = app::create_app(config, backends, identity);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
