//! Global Payment Service - Main Application Entry Point
//!
//! A REST API server that moves money between accounts held in different
//! currencies. Transfers are converted into each account's currency, applied
//! atomically and made idempotent through a client-supplied key.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries), or in-memory storage
//! - **Money**: `rust_decimal` with 10 decimal places
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Connect storage (creating the pool and running migrations for PostgreSQL)
//! 3. Pick the exchange rate client
//! 4. Build HTTP router with routes and middleware
//! 5. Serve until Ctrl-C

mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod models;
mod repositories;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the HTTP router over the given state.
fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        // Account routes
        .route(
            "/api/accounts",
            post(handlers::accounts::create_account).get(handlers::accounts::list_accounts),
        )
        .route("/api/accounts/{id}", get(handlers::accounts::get_account))
        // Transfer routes
        .route(
            "/api/transfers",
            post(handlers::transfers::create_transfer)
                .get(handlers::transfers::list_successful_transfers),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!(backend = ?config.storage_backend, "Configuration loaded");

    let state = AppState::from_config(&config).await?;

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
