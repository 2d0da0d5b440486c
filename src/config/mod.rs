//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (paths, file names, limits)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    Command, DumpConfig, GatewayConfig, LogFormat, LogLevel, Opt, ProvisionConfig, StoreConfig,
};
