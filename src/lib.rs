// Go/No-Go - lick task analysis
// Module declarations and the command-line entry point

pub mod acquisition;
pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod events;
pub mod pipeline;
pub mod pupil;
pub mod raster;
pub mod render;
pub mod store;
pub mod trials;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::AnalysisConfig;

pub fn run() -> anyhow::Result<()> {
    // Parse first so --verbose can set the log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AnalysisConfig::resolve(cli.config.as_deref()).context("Failed to load config")?;

    commands::dispatch(cli.command, config)
}
