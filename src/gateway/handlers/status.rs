//! JSON status handler.

use axum::extract::State;
use axum::Json;

use super::super::types::{AppState, StatusResponse};

/// Outcome counters since startup
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        uptime_seconds: state.start_time.elapsed().as_secs_f64(),
        total_requests: state.stats.total(),
        outcomes: state.stats.snapshot(),
        geoip_version: state.geoip_version.clone(),
    })
}
