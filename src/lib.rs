//! telemetry_gateway library: GeoIP-enriched telemetry ingestion
//!
//! Broker instances phone home with a small JSON event. The gateway resolves
//! the caller's address against a local GeoLite2-City database, merges the
//! location into the event, and forwards the record to a remote run store.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use telemetry_gateway::config::{Command, Opt};
//! use telemetry_gateway::serve;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let opt = Opt::parse();
//! if let Command::Serve(config) = opt.command {
//!     serve(config).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod config;
pub mod error_handling;
pub mod export;
pub mod forward;
pub mod gateway;
pub mod geoip;
pub mod initialization;
pub mod redirect;

// Re-export public API
pub use export::{dump, DumpReport};
pub use forward::StoreClient;
pub use gateway::{create_router, serve, AppState};
pub use geoip::{ensure_ready, GeoDatabase, GeoLocation, GeoLookup, GeoResolver};
