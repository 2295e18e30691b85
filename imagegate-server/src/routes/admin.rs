//! Operational endpoints for the admission queue.
//!
//! Both endpoints require `Authorization: Bearer <IMAGEGATE_ADMIN_TOKEN>`.
//! Authorization is checked before any queue state is read.

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::auth::authorize;
use crate::error::ServerError;
use crate::monitor::{MemorySnapshot, StatusReport};
use crate::state::AppState;

/// Queue occupancy, metrics, process memory and alerts
///
/// GET /admin/queue/status
pub async fn queue_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusReport>, ServerError> {
    authorize(&headers, state.config.admin_token.as_deref())?;

    let report = StatusReport::new(
        state.queue.status(),
        MemorySnapshot::capture(),
        &state.config.alerts,
    );
    Ok(Json(report))
}

/// Zero cumulative queue metrics
///
/// POST /admin/queue/reset
pub async fn reset_queue_metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ServerError> {
    authorize(&headers, state.config.admin_token.as_deref())?;

    state.queue.reset_metrics();
    info!("Queue metrics reset by admin request");

    Ok(Json(json!({
        "success": true,
        "message": "Queue metrics reset",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
