//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration. Secrets and workspace identifiers are read from the
//! environment through clap's `env` attribute, so a `.env` file loaded at
//! startup is enough to configure the gateway.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_EXPORT_FILE, DEFAULT_EXPORT_PAGE_SIZE, DEFAULT_GEOIP_DIR,
    DEFAULT_LOOKUP_CONCURRENCY, DEFAULT_PORT, MAXMIND_DOWNLOAD_BASE, STORE_DOMAIN,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Run the gateway (credentials from the environment or .env)
/// telemetry_gateway serve --port 8080
///
/// # Export every stored run to rows.json
/// telemetry_gateway dump --output rows.json
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "telemetry_gateway",
    about = "Enriches phone-home telemetry with GeoIP data and forwards it to the run store."
)]
pub struct Opt {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Provision the GeoIP database and serve the ingress endpoint
    Serve(GatewayConfig),
    /// Export every stored run record to a JSON-lines file
    Dump(DumpConfig),
}

/// Connection settings for the remote run store.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Bearer credential for the store API
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Workspace identifier (first label of the store host)
    #[arg(long, env = "WORKSPACE")]
    pub workspace: String,

    /// Region identifier (second label of the store host)
    #[arg(long, env = "REGION")]
    pub region: String,

    /// Explicit store base URL, overriding `https://<workspace>.<region>.xata.sh`
    #[arg(long, env = "STORE_URL")]
    pub store_url: Option<String>,
}

impl StoreConfig {
    /// Returns the store base URL, honouring an explicit override.
    pub fn base_url(&self) -> String {
        match &self.store_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}.{}", self.workspace, self.region, STORE_DOMAIN),
        }
    }
}

/// GeoIP provisioning settings.
#[derive(Debug, Clone, Args)]
pub struct ProvisionConfig {
    /// MaxMind license key used to download the GeoLite2-City archive
    #[arg(long, env = "GEOLITE2_LICENSE_KEY", hide_env_values = true)]
    pub license_key: String,

    /// Local directory for the GeoIP archive and database
    #[arg(long, value_parser, default_value = DEFAULT_GEOIP_DIR)]
    pub geoip_dir: PathBuf,

    /// Base URL of the GeoIP archive source
    #[arg(long, default_value = MAXMIND_DOWNLOAD_BASE)]
    pub geoip_source: String,
}

/// Settings for the `serve` subcommand.
#[derive(Debug, Clone, Args)]
pub struct GatewayConfig {
    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub provision: ProvisionConfig,

    /// Address the ingress listener binds to
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS)]
    pub bind: String,

    /// TCP port for the ingress listener
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum number of GeoIP lookups running at once
    #[arg(long, default_value_t = DEFAULT_LOOKUP_CONCURRENCY)]
    pub lookup_concurrency: usize,
}

/// Settings for the `dump` subcommand.
#[derive(Debug, Clone, Args)]
pub struct DumpConfig {
    #[command(flatten)]
    pub store: StoreConfig,

    /// File that receives one JSON record per line
    #[arg(long, value_parser, default_value = DEFAULT_EXPORT_FILE)]
    pub output: PathBuf,

    /// Records requested per page
    #[arg(long, default_value_t = DEFAULT_EXPORT_PAGE_SIZE)]
    pub page_size: usize,
}
