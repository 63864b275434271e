use super::state::AppState;
use crate::error::ScanError;
use crate::session::SessionStats;
use crate::store::CURRENT_CREDENTIAL_KEY;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartScanRequest {
    /// Page that receives the verdict (default from config)
    pub result_page: Option<String>,

    /// Caller-type tag passed through to the result page
    pub caller_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartScanResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CancelScanResponse {
    pub session_id: String,
    pub status: String,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error })).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /scans/start
/// Start a new scan session
pub async fn start_scan(
    State(state): State<AppState>,
    Json(req): Json<StartScanRequest>,
) -> impl IntoResponse {
    let result_page = req
        .result_page
        .unwrap_or_else(|| state.pipeline.default_result_page().to_string());
    let caller_type = req
        .caller_type
        .unwrap_or_else(|| state.pipeline.default_caller_type().to_string());

    state.prune_finished().await;

    let handle = match state.pipeline.start_scan(&result_page, &caller_type).await {
        Ok(handle) => Arc::new(handle),
        Err(e) => {
            error!("Failed to start scan: {:#}", e);
            let status = match e.downcast_ref::<ScanError>() {
                Some(ScanError::StreamAcquisitionFailed(_)) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return error_response(status, format!("Failed to start scan: {:#}", e));
        }
    };

    let session_id = handle.session_id().to_string();

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), handle);
    }

    info!("Scan started: {}", session_id);

    (
        StatusCode::OK,
        Json(StartScanResponse {
            session_id: session_id.clone(),
            status: "scanning".to_string(),
            message: format!("Scanning for {}", result_page),
        }),
    )
        .into_response()
}

/// POST /scans/cancel/:session_id
/// Cancel a scan session and release its camera
pub async fn cancel_scan(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Cancelling scan: {}", session_id);

    let handle = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match handle {
        Some(handle) => {
            let stats = handle.stop().await;
            (
                StatusCode::OK,
                Json(CancelScanResponse {
                    session_id,
                    status: "cancelled".to_string(),
                    stats,
                }),
            )
                .into_response()
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Scan {} not found", session_id),
        ),
    }
}

/// GET /scans/:session_id/status
/// Get state, progress and verdict of a scan session
pub async fn get_scan_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let handle = state.sessions.read().await.get(&session_id).cloned();

    match handle {
        Some(handle) => (StatusCode::OK, Json(handle.stats().await)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Scan {} not found", session_id),
        ),
    }
}

/// GET /credential/current
/// Credential decoded by the last scan
pub async fn get_current_credential(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.pipeline.verifier().store();

    match store.get(CURRENT_CREDENTIAL_KEY).await {
        Ok(Some(value)) => (StatusCode::OK, Json(value)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No current credential".to_string()),
        Err(e) => {
            error!("Failed to read current credential: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read current credential: {}", e),
            )
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
