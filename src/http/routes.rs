use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Scan control
        .route("/scans/start", post(handlers::start_scan))
        .route("/scans/cancel/:session_id", post(handlers::cancel_scan))
        // Scan queries
        .route("/scans/:session_id/status", get(handlers::get_scan_status))
        .route("/credential/current", get(handlers::get_current_credential))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
