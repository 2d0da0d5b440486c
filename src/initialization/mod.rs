//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources:
//! - Logger
//! - HTTP clients (GeoIP download, store forwarding)
//! - Lookup concurrency limiter
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

use std::sync::Arc;

use tokio::sync::Semaphore;

// Re-export public API
pub use client::{init_download_client, init_store_client};
pub use logger::init_logger_with;

/// Initializes a semaphore for bounding concurrent blocking work.
///
/// A count of zero would deadlock every lookup, so it is raised to one.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count.max(1)))
}
