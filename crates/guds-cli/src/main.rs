//! GUDS CLI - Geoserver Upload/Download Script
//!
//! Publishes netCDF model output, topo images, lidar flights, shapefiles and
//! SLD styles to a GeoServer over its REST API.

mod cli;
mod commands;
mod dry_run;
mod errors;
mod interactive;
mod output;
mod output_types;
mod progress;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    // Logs go to stderr so stdout stays parseable under --json
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.debug);
    tracing::info!(
        "Geoserver Upload/Download Script (GUDS) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            errors::CliError::new(format!("Cannot start the async runtime: {}", e)).display();
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::execute(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            errors::from_anyhow(e).display();
            ExitCode::FAILURE
        }
    }
}
