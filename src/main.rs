//! slotswap server entry point.
//!
//! Starts the Axum HTTP server with the webhook and health endpoints.

use std::sync::Arc;
use std::time::Duration;

use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use slotswap::api;
use slotswap::app_state::AppState;
use slotswap::config::BotConfig;
use slotswap::notify::{LineNotifier, NoopNotifier, Notifier};
use slotswap::persistence::RequestStore;
use slotswap::persistence::memory::MemoryStore;
use slotswap::persistence::postgres::PgRequestStore;
use slotswap::service::{IntakeService, MatchEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = BotConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting slotswap");

    // Storage backend
    let store: Arc<dyn RequestStore> = match &config.database_url {
        Some(url) => {
            let pg = PgRequestStore::connect(&config, url).await?;
            pg.ensure_schema().await?;
            tracing::info!("postgres store ready");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL unset; using the in-memory store (data is volatile)");
            Arc::new(MemoryStore::new())
        }
    };

    // Outbound delivery
    let notifier: Arc<dyn Notifier> = if config.channel_access_token.is_empty() {
        tracing::warn!("LINE_CHANNEL_ACCESS_TOKEN unset; replies and pushes go to the log only");
        Arc::new(NoopNotifier)
    } else {
        Arc::new(LineNotifier::new(config.channel_access_token.clone()))
    };

    // Service layer
    let engine = Arc::new(MatchEngine::new(Arc::clone(&store), Arc::clone(&notifier)));
    let intake = Arc::new(IntakeService::new(Arc::clone(&store), engine, &config));

    // Build application state
    let app_state = AppState {
        intake,
        notifier,
        channel_secret: config.channel_secret.clone(),
    };

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
