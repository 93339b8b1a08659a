mod config;
mod errors;
mod export;
mod generation;
mod grading;
mod ingest;
mod llm_client;
mod models;
mod progress;
mod report;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::grading::judge::LlmAnswerJudge;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::SessionStore;

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

    info!("Starting Studyhall API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the LLM client
    let llm = LlmClient::new(config.openrouter_api_key.clone(), config.llm_base_url.clone());
    info!("LLM client initialized (endpoint: {})", config.llm_base_url);

    // Short-answer judge (LLM-backed by default)
    let judge = Arc::new(LlmAnswerJudge::new(llm.clone()));

    // Per-session content store — lives for the process, owns all study data
    let store = SessionStore::new();

    // Build app state
    let state = AppState {
        store,
        llm,
        judge,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
