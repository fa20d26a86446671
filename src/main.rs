mod config;
mod error;
mod extractors;
mod models;
mod routes;
mod services;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;
use crate::routes::{AppState, build_router};
use crate::services::llm::LLMClient;
use crate::services::media::CloudinaryClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    if !config.gemini.is_configured() {
        tracing::warn!("GEMINI_API_KEY is not set; /api/generate will fail until it is");
    }
    if !config.cloudinary.is_configured() {
        tracing::warn!("Cloudinary credentials are incomplete; /api/upload will fail until they are set");
    }

    let story_generator = Arc::new(
        LLMClient::new(config.gemini.clone()).context("failed to create Gemini client")?,
    );
    tracing::info!(model = %config.gemini.model, "Initialized Gemini client");

    let media_store = Arc::new(CloudinaryClient::new(config.cloudinary.clone()));

    let app = build_router(AppState {
        story_generator,
        media_store,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
