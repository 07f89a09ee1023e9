//! HTTP surface of the Brand Concierge.
//!
//! - `POST /api/chat`, `POST /api/proxy`: ask a question
//! - `GET /health`: active provider, model and knowledge source

mod core;
mod error_handler;
mod routes;

use std::{env, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use crate::{core::app_state::AppState, error_handler::AppError};
use crate::routes::{
    chat::chat_route::{chat, method_not_allowed},
    health_route::health,
};

const DEFAULT_ADDRESS: &str = "0.0.0.0:3000";

pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());

    let state = Arc::new(AppState::from_env()?);
    state.concierge.warm_up().await;

    let app = router(state);

    // Bind to address
    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(|source| AppError::Bind {
            addr: host_url.clone(),
            source,
        })?;
    info!(addr = %host_url, "brand concierge listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Builds the application router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let chat_routes = post(chat).fallback(method_not_allowed);

    Router::new()
        .route("/api/chat", chat_routes.clone())
        .route("/api/proxy", chat_routes)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    // Without a signal handler the server runs until killed.
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
