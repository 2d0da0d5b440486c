//! Gateway shared state and response bodies.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::error_handling::GatewayStats;
use crate::forward::StoreClient;
use crate::geoip::GeoResolver;

/// Shared state for the ingress router
#[derive(Clone)]
pub struct AppState {
    pub resolver: GeoResolver,
    pub store: StoreClient,
    pub stats: Arc<GatewayStats>,
    pub start_time: Arc<Instant>,
    /// Build version of the opened GeoIP database, when known
    pub geoip_version: Option<String>,
}

impl AppState {
    pub fn new(resolver: GeoResolver, store: StoreClient, geoip_version: Option<String>) -> Self {
        AppState {
            resolver,
            store,
            stats: Arc::new(GatewayStats::new()),
            start_time: Arc::new(Instant::now()),
            geoip_version,
        }
    }
}

/// JSON response for the status endpoint
#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_seconds: f64,
    pub total_requests: usize,
    pub outcomes: BTreeMap<&'static str, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geoip_version: Option<String>,
}
