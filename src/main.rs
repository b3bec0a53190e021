//! AttachHub CLI entry point.
//!
//! Loads a JSON manifest of attachment nodes into the in-memory repository,
//! runs one operation against the configured storage root, and writes the
//! manifest back after mutating commands.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use attachhub_core::config::AppConfig;
use attachhub_core::config::logging::LoggingConfig;

mod commands;
mod manifest;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config_env) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);
    tracing::debug!(env = %cli.config_env, root = %config.storage.root_path, "Loaded configuration");

    if let Err(e) = cli.execute(&config).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
