//! Error handling and outcome statistics.
//!
//! This module provides:
//! - Error type definitions for provisioning, lookup, redirect, and forwarding
//! - Outcome statistics tracking for the status endpoint
//!
//! Errors are grouped by how far they propagate:
//! - **Fatal**: `ProvisionError` aborts startup
//! - **Request-level**: `ResolverError`, `ForwardError`, `EventError` are mapped
//!   to an HTTP status at the gateway boundary

mod stats;
mod types;

// Re-export public API
pub use stats::GatewayStats;
pub use types::{
    EventError, ForwardError, InitializationError, OutcomeType, ProvisionError, RedirectError,
    ResolverError,
};
