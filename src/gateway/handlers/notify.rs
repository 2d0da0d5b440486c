//! Telemetry ingress handler.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};

use super::super::record::{parse_event, EnrichedRecord};
use super::super::types::AppState;
use crate::error_handling::OutcomeType;

/// Maps a request outcome to the status returned to the caller.
pub fn status_for(outcome: OutcomeType) -> StatusCode {
    match outcome {
        OutcomeType::Stored => StatusCode::OK,
        OutcomeType::StoreRejected => StatusCode::NOT_FOUND,
        OutcomeType::ResolverFailed | OutcomeType::ForwardFailed => StatusCode::BAD_GATEWAY,
        OutcomeType::BadRequest => StatusCode::BAD_REQUEST,
    }
}

/// Enriches one telemetry event and forwards it to the store.
pub async fn notify_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> StatusCode {
    let received_at = Utc::now();
    // Dual-stack listeners report IPv4 peers as ::ffff:a.b.c.d
    let source_ip = peer.ip().to_canonical().to_string();

    let outcome = process(&state, &source_ip, received_at, &body).await;
    state.stats.increment(outcome);
    status_for(outcome)
}

async fn process(
    state: &AppState,
    source_ip: &str,
    received_at: DateTime<Utc>,
    body: &[u8],
) -> OutcomeType {
    let event = match parse_event(body) {
        Ok(event) => event,
        Err(e) => {
            log::warn!("Rejected telemetry from {}: {}", source_ip, e);
            return OutcomeType::BadRequest;
        }
    };

    let target = event.remote_ip.as_deref().unwrap_or(source_ip);
    let location = match state.resolver.resolve(target).await {
        Ok(location) => location,
        Err(e) => {
            log::error!("GeoIP resolution failed for {}: {}", target, e);
            return OutcomeType::ResolverFailed;
        }
    };

    let record = EnrichedRecord::new(source_ip, received_at, location, event);
    match state.store.insert(&record).await {
        Ok(status) if status == StatusCode::CREATED => {
            log::debug!(
                "Stored telemetry from {} ({:?})",
                record.source_ip(),
                record.location()
            );
            OutcomeType::Stored
        }
        Ok(status) => {
            log::warn!(
                "Store did not accept telemetry from {}: {}",
                record.source_ip(),
                status
            );
            OutcomeType::StoreRejected
        }
        Err(e) => {
            log::error!("Failed to forward telemetry from {}: {}", record.source_ip(), e);
            OutcomeType::ForwardFailed
        }
    }
}
