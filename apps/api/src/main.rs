mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::analyzer::Analyzer;
use crate::config::Config;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::GeminiClient;
use crate::routes::build_app;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing API key)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the model client once; every request shares it
    let gemini = GeminiClient::from_config(&config)?;
    info!("LLM client initialized (model: {})", gemini.model());

    let policy = RetryPolicy::new(
        config.llm_max_attempts,
        Duration::from_millis(config.llm_base_delay_ms),
    );
    info!(
        "Retry policy: {} attempts, {}ms base delay",
        policy.max_attempts,
        policy.base_delay.as_millis()
    );

    let state = AppState {
        analyzer: Analyzer::new(Arc::new(gemini), policy),
        config: config.clone(),
    };

    let app = build_app(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
