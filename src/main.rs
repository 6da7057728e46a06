//! Rx Advisor - medical information and drug interaction assistant
//!
//! A Rust backend running a bounded, tool-augmented reasoning loop that
//! answers drug usage and interaction questions.

mod api;
mod config;
mod llm;
mod runtime;
mod state_machine;
mod system_prompt;
mod tools;
mod transcript;

use api::{create_router, AppState};
use config::AppConfig;
use runtime::{Orchestrator, ServiceLlmClient};
use state_machine::LoopPolicy;
use std::net::SocketAddr;
use std::sync::Arc;
use tools::ToolRegistry;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transcript::TerminalMarker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; real environment variables take precedence
    let dotenv_path = dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rx_advisor=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    if let Some(path) = dotenv_path {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    // Configuration
    let config = AppConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;

    let service = llm::create_service(&config.llm)?;
    tracing::info!(
        model = %service.model_id(),
        context_window = service.context_window(),
        temperature = config.llm.temperature,
        "Model service initialized"
    );

    let registry = Arc::new(ToolRegistry::standard(
        &config.search,
        config.agent.tool_timeout,
    )?);
    tracing::info!(
        tools = ?registry.definitions().iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
        "Tool registry initialized"
    );

    let policy = LoopPolicy::new(config.agent.max_messages, TerminalMarker::default());
    let orchestrator: runtime::ProductionOrchestrator =
        Orchestrator::new(ServiceLlmClient::new(service), registry, policy)
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens)
            .with_llm_timeout(config.agent.llm_timeout);

    // Create application state
    let state = AppState::new(Arc::new(orchestrator));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        max_messages = config.agent.max_messages,
        "Rx Advisor listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
