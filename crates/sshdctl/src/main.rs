mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, GlobalOpts};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    match commands::dispatch(cli.command, &cli.global).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

/// Workspace crates log at the level picked by `-v`/`-q`; dependencies
/// stay at `warn`. `RUST_LOG` replaces the whole filter.
fn init_tracing(global: &GlobalOpts) {
    let level = match (global.quiet, global.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let directives = ["sshdctl", "sshdctl_api", "sshdctl_core", "sshdctl_config"]
        .iter()
        .fold(String::from("warn"), |acc, krate| format!("{acc},{krate}={level}"));

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
