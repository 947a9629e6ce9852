use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use visitor_counter::api;
use visitor_counter::auth::OriginGate;
use visitor_counter::clock::{Clock, SystemClock};
use visitor_counter::config::Config;
use visitor_counter::storage::{self, spawn_expiry_sweeper};
use visitor_counter::visits::VisitCounter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("visitor_counter=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let storage = storage::connect(&config.store.url, config.store.max_connections).await?;
    info!("Initializing store...");
    storage.init().await?;
    info!("Store initialized successfully");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let sweeper = if config.store.purge_interval_secs > 0 {
        Some(spawn_expiry_sweeper(
            Arc::clone(&storage),
            Arc::clone(&clock),
            config.store.purge_interval_secs,
        ))
    } else {
        warn!("Expired lock sweeper disabled; relying on the store's own expiry");
        None
    };

    let counter = VisitCounter::with_storage(
        Arc::clone(&storage),
        clock,
        config.visits.cooldown_secs,
        config.visits.cache_ttl_secs,
    );
    info!(
        "⏱  Cooldown {}s, stats cache TTL {}s",
        config.visits.cooldown_secs, config.visits.cache_ttl_secs
    );

    let gate = Arc::new(OriginGate::new(config.auth.token.clone()));
    let cors = api::cors_layer(config.cors.allowed_origin.as_deref())?;
    match config.cors.allowed_origin.as_deref() {
        Some(domain) => info!("🌐 CORS restricted to https://{}", domain),
        None => info!("🌐 CORS allows any origin"),
    }

    let router = api::create_router(counter, gate, cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Visitor counter listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
