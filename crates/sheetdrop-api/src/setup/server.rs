//! Server startup and graceful shutdown

use anyhow::Result;
use axum::Router;
use sheetdrop_core::Config;
use std::future::Future;
use std::io;

/// Start the server with graceful shutdown
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = config.bind_addr();
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        max_upload_mb = config.max_upload_size_bytes / 1024 / 1024,
        upload_dir = %config.upload_dir.display(),
        upload_route = %config.upload_route,
        verify_file_signature = config.verify_file_signature,
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = wait_for("Ctrl+C", tokio::signal::ctrl_c());

    #[cfg(unix)]
    let terminate = wait_for("terminate", async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?
            .recv()
            .await;
        Ok::<(), io::Error>(())
    });

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down gracefully...");
}

/// Wait for one signal. A listener that cannot be installed never resolves,
/// so the server keeps running on the remaining ones.
async fn wait_for<F>(name: &'static str, signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!(signal = name, "Received shutdown signal"),
        Err(e) => {
            tracing::error!(signal = name, error = %e, "Failed to listen for signal");
            std::future::pending::<()>().await;
        }
    }
}
