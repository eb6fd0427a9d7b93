//! gc-game - Guesscasso round service
//!
//! Loads the category word lists, wires the image and scoring collaborators
//! into the round orchestrator and serves the round API over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use gc_game::config::{Args, GameConfig};
use gc_game::services::{ChatCompletionsScorer, HuggingFaceClient};
use gc_game::words::CategoryTable;
use gc_game::{build_router, AppState, RoundOrchestrator, BUILD_INFO};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, config_source) =
        GameConfig::load(&args).context("Failed to load configuration")?;

    gc_common::logging::init_tracing(&config.log_level)?;

    info!("Starting Guesscasso round service (gc-game) {}", BUILD_INFO);
    config_source.log();

    info!("Words folder: {}", config.words_folder.display());
    let categories = CategoryTable::load_dir(&config.words_folder)
        .with_context(|| format!("Failed to load word lists from {}", config.words_folder.display()))?;

    if config.image_synthesis.api_key.is_none() {
        warn!("No Hugging Face API key configured; rounds may fall back to placeholder images");
    }
    if config.scoring.api_key.is_none() {
        warn!("No scoring API key configured; non-exact guesses may fail to score");
    }

    let synthesizer = HuggingFaceClient::new(
        config.image_synthesis.endpoint.clone(),
        config.image_synthesis.model.clone(),
        config.image_synthesis.api_key.clone(),
        config.round.synthesis_timeout,
    )
    .context("Failed to create image synthesis client")?;

    let scorer = ChatCompletionsScorer::new(
        config.scoring.endpoint.clone(),
        config.scoring.model.clone(),
        config.scoring.api_key.clone(),
        config.round.scoring_timeout,
    )
    .context("Failed to create scoring client")?;

    // Category errors are fatal here, before the listener is bound
    let orchestrator = match RoundOrchestrator::new(
        Arc::new(categories),
        Arc::new(synthesizer),
        Arc::new(scorer),
        config.round.clone(),
    ) {
        Ok(orchestrator) => {
            info!(
                "✓ Round pipeline ready: {} categories, {} rungs per ladder",
                orchestrator.categories().len(),
                config.round.rung_count
            );
            orchestrator
        }
        Err(e) => {
            error!("Cannot serve rounds: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(Arc::new(orchestrator));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    info!("gc-game listening on http://{}", config.listen_addr);
    info!("Health check: http://{}/health", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
