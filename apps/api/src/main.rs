mod backend;
mod config;
mod db;
mod errors;
mod models;
mod notifications;
mod pipeline;
mod records;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backend::BackendClient;
use crate::config::Config;
use crate::db::create_pool;
use crate::notifications::NotificationCenter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{seed_default_pipelines, InMemoryRepository, PgRepository, RecordRepository};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hiring API v{}", env!("CARGO_PKG_VERSION"));

    // Record store: Postgres when configured, in-memory otherwise
    let repo: Arc<dyn RecordRepository> = match &config.database_url {
        Some(url) => Arc::new(PgRepository::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; records live in memory and are lost on restart");
            Arc::new(InMemoryRepository::new())
        }
    };

    if config.seed_default_pipelines {
        let seeded = seed_default_pipelines(repo.as_ref())
            .await
            .context("Failed to seed default pipelines")?;
        info!("Seeded {seeded} default pipelines");
    }

    // Initialize backend client
    if config.backend_accept_invalid_certs {
        warn!("BACKEND_ACCEPT_INVALID_CERTS is on: TLS certificates from the backend are not verified");
    }
    let backend = BackendClient::new(
        config.backend_url.clone(),
        Duration::from_secs(config.backend_timeout_secs),
        config.backend_accept_invalid_certs,
    )
    .context("Failed to build backend HTTP client")?;
    match &config.backend_url {
        Some(url) => info!(
            "Backend proxy -> {url} (mock fallback {})",
            if config.backend_mock_fallback { "on" } else { "off" }
        ),
        None => warn!("BACKEND_URL not set; proxy routes will serve fallback data or 502"),
    }

    // Build app state
    let state = AppState {
        repo,
        notifications: NotificationCenter::new(),
        backend,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the front-end host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
