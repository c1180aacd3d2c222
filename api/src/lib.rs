pub mod core;
pub mod error_handler;
pub mod routes;

use std::sync::Arc;

use axum::{Router, routing::get};
use services::env::{env_opt, env_parse};
use tokio::signal;
use tracing::{error, info};

use crate::{
    core::app_state::AppState,
    error_handler::AppError,
    routes::{embedd::embedd_route::embedd, health_route::health},
};

const DEFAULT_PORT: u16 = 8080;

/// Builds the state from env, binds the listener and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let state = Arc::new(AppState::from_env()?);
    let addr = bind_address()?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(AppError::Bind)?;
    info!(%addr, "bill embedder listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/embedd", get(embedd))
        .route("/health", get(health))
        .with_state(state)
}

/// `API_ADDRESS` wins; otherwise all interfaces on `PORT` (default 8080).
fn bind_address() -> Result<String, AppError> {
    if let Some(addr) = env_opt("API_ADDRESS") {
        return Ok(addr);
    }
    let port = env_parse::<u16>("PORT")?.unwrap_or(DEFAULT_PORT);
    Ok(format!("0.0.0.0:{port}"))
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
