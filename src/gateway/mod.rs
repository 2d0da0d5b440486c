//! Telemetry ingress server.
//!
//! Provides two endpoints under the API prefix:
//! - `POST /api/v1/notify` - enrich one telemetry event and forward it to the store
//! - `GET /api/v1/status` - JSON outcome counters since startup
//!
//! [`serve`] provisions the GeoIP database before the router is built, so the
//! listener never accepts a request that could race provisioning.

mod handlers;
mod record;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;

use crate::config::{GatewayConfig, API_PREFIX};
use crate::forward::StoreClient;
use crate::geoip::{ensure_ready, GeoResolver};
use crate::initialization::{init_download_client, init_semaphore, init_store_client};

pub use handlers::{notify_handler, status_for, status_handler};
pub use record::{format_timestamp, parse_event, EnrichedRecord, TelemetryEvent};
pub use types::{AppState, StatusResponse};

/// Builds the ingress router over shared state.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(&format!("{}/notify", API_PREFIX), post(notify_handler))
        .route(&format!("{}/status", API_PREFIX), get(status_handler))
        .with_state(state)
}

/// Provisions GeoIP, then serves the ingress endpoint until Ctrl-C.
///
/// # Errors
///
/// Returns an error if provisioning fails, the store settings are invalid, or
/// the listener cannot be bound. Nothing is served in any of those cases.
pub async fn serve(config: GatewayConfig) -> Result<()> {
    let download_client = init_download_client().context("Failed to initialize HTTP client")?;
    let database = ensure_ready(&config.provision, &download_client)
        .await
        .context("GeoIP provisioning failed")?;
    log::info!("GeoIP database ready at {}", database.path().display());
    let geoip_version = database.version();

    let resolver = GeoResolver::new(
        Arc::new(database),
        init_semaphore(config.lookup_concurrency),
    );
    let store_client = init_store_client().context("Failed to initialize store client")?;
    let store = StoreClient::new(store_client, &config.store)
        .context("Invalid store configuration")?;
    log::info!("Forwarding records to {}", store.base_url());

    let app = create_router(AppState::new(resolver, store, Some(geoip_version)));

    let address = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind ingress listener to {}", address))?;
    log::info!("Gateway listening on http://{}{}/notify", address, API_PREFIX);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Gateway server error")?;

    log::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
