pub mod cli;
pub mod commands;
pub mod core;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Install the stderr log subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tale_launcher_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    tracing::debug!("TaleLauncher {} starting", env!("CARGO_PKG_VERSION"));

    match commands::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
