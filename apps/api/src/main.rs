mod catalog;
mod config;
mod errors;
mod gateway;
mod llm_client;
mod models;
mod orchestrator;
mod routes;
mod sessions;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::gateway::{GeminiGateway, ReportGateway};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::sessions::{SessionRegistry, SWEEP_INTERVAL};
use crate::state::AppState;
use crate::storage::{FileSnapshotStore, RedisSnapshotStore, SnapshotStore};

#[tokio::main]
async fn main() -> Result<()> {
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

    info!("Starting A-level explorer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    )?;
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; analysis requests will fail");
    }
    info!("LLM client initialized (model: {})", llm.model());
    let gateway: Arc<dyn ReportGateway> = Arc::new(GeminiGateway::new(llm));

    // Snapshot storage: Redis when configured, local files otherwise
    let store: Arc<dyn SnapshotStore> = match &config.redis_url {
        Some(url) => {
            let store = RedisSnapshotStore::connect(url).await?;
            info!("Snapshot store: Redis");
            Arc::new(store)
        }
        None => {
            let store = FileSnapshotStore::open(&config.snapshot_dir).await?;
            info!("Snapshot store: {}", config.snapshot_dir.display());
            Arc::new(store)
        }
    };

    let sessions = Arc::new(SessionRegistry::new(
        gateway,
        store,
        config.include_skip_analysis,
        config.session_idle_timeout,
    ));
    sessions.clone().spawn_sweeper(SWEEP_INTERVAL);
    info!(
        "Idle sessions expire after {}s",
        config.session_idle_timeout.as_secs()
    );

    let state = AppState {
        sessions,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
