//! unmix CLI - Audio Source Separation
//!
//! Command-line interface for stem separation and drum decomposition.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::info;

use unmix::cli::{commands, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("unmix v{}", env!("CARGO_PKG_VERSION"));

    match commands::run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {}", e.error_code(), e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            ExitCode::FAILURE
        }
    }
}
