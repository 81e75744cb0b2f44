//! Server initialization
//!
//! Builds the storage backend and session store from configuration, starts
//! the background sweep, serves the HTTP API and tears everything down on
//! Ctrl+C or SIGTERM.

use super::loader::load_config;
use crate::api::api_router;
use agentpad_core::{create_backend, spawn_sweeper, SessionStore, Workspace};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Time allowed for the sweeper to stop after cancellation
const SWEEPER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Run the server until a shutdown signal arrives
pub async fn run() -> Result<()> {
    let config = load_config()?;

    info!(
        "Starting Agentpad v{} (backend: {}, ttl: {}h)",
        env!("CARGO_PKG_VERSION"),
        config.store.backend,
        config.store.ttl_hours
    );

    let backend = create_backend(&config.store)
        .await
        .context("Failed to initialize storage backend")?;
    let store = Arc::new(SessionStore::from_config(backend, &config.store));
    let workspace = Workspace::new(store.clone());

    let shutdown = CancellationToken::new();

    let sweeper = if store.needs_sweep() {
        let interval = config.store.cleanup_interval();
        Some(spawn_sweeper(store.clone(), interval, shutdown.clone()))
    } else {
        info!("Backend expires sessions natively, sweeper disabled");
        None
    };

    let app = api_router(workspace, config.store.ttl_hours).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server listening on http://{}", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await
        .context("HTTP server error")?;

    // Covers the case where serve returned without a signal
    shutdown.cancel();

    if let Some(handle) = sweeper {
        match tokio::time::timeout(SWEEPER_SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Sweeper task error: {}", e),
            Err(_) => warn!("Sweeper shutdown timeout"),
        }
    }

    if let Err(e) = store.disconnect().await {
        error!("Failed to disconnect storage backend: {}", e);
    }

    info!("Agentpad shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
