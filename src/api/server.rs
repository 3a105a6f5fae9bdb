use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::{
    services::{add_log, health, metrics, pending_logs, process_queue},
    state::AppState,
};
use crate::config::Config;
use crate::engine::Engine;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Routes of the HTTP façade, without a listener attached
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/logs", post(add_log).get(pending_logs))
        .route("/process", post(process_queue))
        .route("/metrics", get(metrics))
        .with_state(state)
        // Automatically decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Serve the façade until SIGINT/SIGTERM, then shut the engine down.
///
/// The engine must already be initialized; `address` overrides
/// `server.bind_addr`.
pub async fn run(
    config: Config,
    engine: Arc<Engine>,
    address: Option<SocketAddr>,
) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);
    let state = AppState::new(config, Arc::clone(&engine));
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "Log engine API listening");

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if !engine.shutdown() {
        error!(reason = %engine.last_error(), "Engine shutdown failed");
    }

    served?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
