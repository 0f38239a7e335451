//! reasoning-flow - five-step reasoning service backed by Gemini
//!
//! Sends a query to the model, then keeps asking for the next step until the
//! model returns its final result. Progress is streamed to clients over SSE.

mod agent;
mod api;
mod config;
mod credential;
mod db;
mod llm;
mod runtime;
mod state_machine;
mod system_prompt;

use agent::StepClient;
use api::{create_router, AppState};
use config::Config;
use credential::{CredentialResolver, CredentialSource};
use db::Database;
use llm::{GeminiService, LlmService, LoggingService};
use runtime::RuntimeManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reasoning_flow=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let gemini = GeminiService::new(&config.gemini)?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(gemini)));

    let credentials = Arc::new(CredentialResolver::new(
        Arc::new(db),
        config.default_api_key.clone(),
    ));
    match credentials.source() {
        CredentialSource::Stored => tracing::info!("Using stored Gemini API key"),
        CredentialSource::Default => tracing::info!("Using default Gemini API key"),
        CredentialSource::None => {
            tracing::warn!("No Gemini API key configured. Set GEMINI_API_KEY or store one in settings.");
        }
    }

    tracing::info!(
        model = %llm.model_id(),
        max_steps = ?config.max_steps,
        "Step client initialized"
    );

    let client = StepClient::new(llm, credentials.clone());
    let runtime = RuntimeManager::new(Arc::new(client), credentials, config.max_steps);
    let state = AppState::new(runtime);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("reasoning-flow server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
