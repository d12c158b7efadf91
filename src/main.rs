//! Clinic LLM Cache - chat service entry point
//!
//! Serves the chat and image endpoints and the cache admin API over one
//! shared set of caches.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_llm_cache::api::create_router;
use clinic_llm_cache::llm::OpenAiCompatClient;
use clinic_llm_cache::{AppState, Config};

/// Main entry point for the chat service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the LLM client and both caches (sweeps start here)
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, stop serving and destroy the caches
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_llm_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic LLM cache service");

    let config = Config::from_env();
    info!(
        response_ttl_ms = config.response_cache_ttl_ms,
        image_ttl_ms = config.image_cache_ttl_ms,
        sweep_interval_ms = config.sweep_interval_ms,
        max_retries = config.max_retries,
        retry_delay_ms = config.retry_delay_ms,
        port = config.server_port,
        model = %config.llm_model,
        image_model = %config.llm_image_model,
        "Configuration loaded"
    );
    if config.llm_api_key.is_none() {
        warn!("LLM_API_KEY is not set, requests will be sent unauthenticated");
    }

    let client =
        Arc::new(OpenAiCompatClient::from_config(&config).context("building LLM client")?);
    let state = AppState::from_config(&config, client.clone(), client);
    info!("Caches initialized");

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    state.destroy().await;
    info!("Caches destroyed, shutdown complete");

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
