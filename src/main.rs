//! `arxcat`: validate and catalog bulk scholarly submission archives.

mod cli;
mod command;
mod config;
mod error;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);
    match command::run(cli).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(%error, "run failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        },
    }
}

/// `RUST_LOG` wins; otherwise `-v` steps warn, info, debug, trace.
fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true).compact()).init();
}
