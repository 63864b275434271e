//! HTTP API for hosting UIs
//!
//! This module provides a REST API for driving scan sessions:
//! - POST /scans/start - Start a scan session
//! - POST /scans/cancel/:id - Cancel a scan and release the camera
//! - GET /scans/:id/status - Query state, progress and verdict
//! - GET /credential/current - Credential decoded by the last scan
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
