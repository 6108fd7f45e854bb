//! Normwave CLI - batch loudness normalization
//!
//! Thin binary wrapper: logger setup, argument parsing, exit code mapping.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::info;

use normwave::cli::{self, Cli};

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Normwave v{}", env!("CARGO_PKG_VERSION"));

    match cli::run(&args) {
        Ok(result) if result.all_succeeded() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}
