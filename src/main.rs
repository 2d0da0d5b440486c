//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `telemetry_gateway` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use telemetry_gateway::config::{Command, Opt};
use telemetry_gateway::initialization::init_logger_with;
use telemetry_gateway::{dump, serve};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // API_KEY, WORKSPACE, REGION and GEOLITE2_LICENSE_KEY usually come from .env.
    // Try the current directory first, then the executable's directory.
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    let log_level = opt.log_level.clone();
    let log_format = opt.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let result = match opt.command {
        Command::Serve(config) => serve(config).await,
        Command::Dump(config) => dump(&config).await.map(|report| {
            println!(
                "Exported {} record{} in {} page{} to {}",
                report.records,
                if report.records == 1 { "" } else { "s" },
                report.pages,
                if report.pages == 1 { "" } else { "s" },
                report.output.display()
            );
        }),
    };

    if let Err(e) = result {
        eprintln!("telemetry_gateway error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
