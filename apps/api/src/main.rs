mod boards;
mod config;
mod db;
mod errors;
mod keywords;
mod llm_client;
mod models;
mod notify;
mod pipeline;
mod render;
mod routes;
mod scoring;
mod state;
mod steps;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::boards::load_fixture_boards;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::LlmClient;
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::pipeline::{Orchestrator, PgSnapshotStore, RunManager};
use crate::render::MarkdownRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::steps::{standard_steps, Collaborators};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobsAI API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = Arc::new(LlmClient::new(config.anthropic_api_key.clone())?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Job boards, one per fixture file
    let boards = load_fixture_boards(&config.board_fixtures_dir)?;
    if boards.is_empty() {
        warn!(
            "No job boards found in {}; every run will fail at the search stage",
            config.board_fixtures_dir.display()
        );
    }

    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            info!("Webhook notifier enabled");
            Arc::new(WebhookNotifier::new(url.clone())?)
        }
        None => Arc::new(LogNotifier),
    };

    let collaborators = Collaborators {
        llm,
        boards,
        renderer: Arc::new(MarkdownRenderer),
        notifier,
        scoring: config.scoring.clone(),
    };
    let mut orchestrator = Orchestrator::new(standard_steps(collaborators))?;
    info!(stages = ?orchestrator.stages(), "Pipeline assembled");

    // Optional PostgreSQL snapshot sink
    if let Some(database_url) = &config.database_url {
        let db = create_pool(database_url).await?;
        ensure_schema(&db).await?;
        orchestrator = orchestrator.with_snapshots(Arc::new(PgSnapshotStore::new(db)));
        info!("Context snapshots enabled");
    }

    let state = AppState {
        runs: Arc::new(RunManager::new(orchestrator)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the questionnaire UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
