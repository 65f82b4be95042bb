// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::refresh_controller::RefreshController;
use crate::application::session::ViewSession;
use crate::infrastructure::config::load_engine_config;
use crate::infrastructure::http_source::HttpTelemetrySource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_scene, health_check, interaction, predictions, refresh, tooltip,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_engine_config().context("Failed to load engine configuration")?;

    // Create collaborator (infrastructure layer)
    let source = Arc::new(HttpTelemetrySource::new(&config.api)?);

    // Create session and controller (application layer)
    let session = ViewSession::new(
        config.chart.total_width,
        config.viewport_settings(),
        config.scene_settings(),
    );
    let controller = RefreshController::new(source, session, config.refresh_settings());

    // Create application state
    let state = Arc::new(AppState { controller });

    // Build router (presentation layer)
    // Compression is applied per response in json_response, so no CompressionLayer
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/refresh", post(refresh))
        .route("/scene", get(get_scene))
        .route("/interaction", post(interaction))
        .route("/tooltip", get(tooltip))
        .route("/predictions/:system", get(predictions))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .addr
        .parse()
        .with_context(|| format!("Invalid server address {}", config.server.addr))?;
    tracing::info!("Starting battery-timeline service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
