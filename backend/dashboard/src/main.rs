//! RWA launch dashboard backend — entry point.
//!
//! Serves a small Axum REST API over an EVM JSON-RPC node: project listing
//! with live launch phases, project creation from factory presets, and
//! phase-gated launch/trade actions driven through an approve-then-execute
//! transaction pipeline.

mod api;
mod config;
mod contracts;
mod errors;
mod pipeline;
mod projects;
mod rpc;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use launch_core::PendingFlags;
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use rpc::EvmClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    // Load config from environment.
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // HTTP client shared by all outbound RPC calls.
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let evm = EvmClient::new(
        client,
        config.rpc_url.clone(),
        config.chain_id,
        config.receipt_poll_interval,
        config.receipt_timeout,
    );
    info!(
        "connected to {} (chain id {})",
        config.rpc_url,
        evm.chain_id()
    );

    // ─── REST API ─────────────────────────────────────────
    let api_port = config.api_port;
    let state = Arc::new(api::AppState {
        client: evm,
        config,
        flags: Arc::new(PendingFlags::new()),
        refreshing: AtomicBool::new(false),
    });

    let app = Router::new()
        .route("/health", get(api::health))
        .route("/projects", get(api::get_projects).post(api::create_project))
        .route("/presets/:profile", get(api::get_preset))
        .route("/projects/:id/actions/:action", post(api::run_action))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{api_port}");
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
