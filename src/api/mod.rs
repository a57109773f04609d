//! HTTP API: routing and server bootstrap.

pub mod dto;
pub mod error;
pub mod handlers;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::StockService;

/// Build the router serving the stock ledger.
pub fn router(service: StockService) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/stock", get(handlers::list_stock))
        .route(
            "/stock/move",
            post(handlers::record_movement).get(handlers::get_move_product_stock),
        )
        .route("/stock/:product", get(handlers::get_stock))
        .route(
            "/stock/:product/movements",
            get(handlers::list_product_movements),
        )
        .route("/stock/:product/summary", get(handlers::get_summary))
        .route("/movements/:id", get(handlers::get_movement))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on `addr` until Ctrl-C.
pub async fn serve(service: StockService, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal(tokio::signal::ctrl_c()))
        .await
        .context("HTTP server failed")?;

    info!("server stopped");
    Ok(())
}

/// Resolves once `signal` fires. If the handler cannot be installed the
/// server keeps running until the process is killed.
async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
