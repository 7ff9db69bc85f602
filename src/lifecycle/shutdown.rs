//! Graceful Shutdown Handler
//!
//! Waits for SIGINT/SIGTERM and walks the lifecycle through `stopping` and `stopped`.

use super::LifecycleEnvironment;
use std::sync::Arc;
use tokio::signal;

/// Drives the shutdown half of a [`LifecycleEnvironment`]
///
/// # Example
///
/// ```rust,ignore
/// let lifecycle = Arc::new(lifecycle);
/// let shutdown_handler = ShutdownHandler::new(Arc::clone(&lifecycle));
///
/// axum::serve(listener, router)
///     .with_graceful_shutdown(async move { shutdown_handler.wait_for_shutdown().await })
///     .await?;
/// ```
pub struct ShutdownHandler {
    lifecycle: Arc<LifecycleEnvironment>,
}

impl ShutdownHandler {
    pub fn new(lifecycle: Arc<LifecycleEnvironment>) -> Self {
        Self { lifecycle }
    }

    /// Wait for a shutdown signal, then fire `stopping` and `stopped`.
    pub async fn wait_for_shutdown(&self) {
        shutdown_signal().await;
        tracing::info!("Starting graceful shutdown...");
        self.lifecycle.stop().await;
    }
}

/// Completes when Ctrl+C or SIGTERM is received
///
/// If a signal handler cannot be installed that branch never completes; the
/// other one still can.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
