use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use repodoc::cli::load_config;
use repodoc::http::router;
use repodoc::logging::init_tracing;
use repodoc::DocumentService;

#[tokio::main]
async fn main() -> Result<()> {
    let verbose = std::env::args().any(|arg| arg == "--verbose" || arg == "-v");
    init_tracing(verbose);

    let config = load_config(None)?;
    let service = DocumentService::from_config(&config).context("Failed to build the document service")?;
    if !service.can_generate() {
        tracing::warn!("No generation API key configured; /api/generate will fail");
    }

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("repodoc server {} listening on {}", repodoc::VERSION, addr);
    axum::serve(listener, router(Arc::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}
