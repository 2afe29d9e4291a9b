//! montepi CLI - π estimation engine
//!
//! Command-line interface for sampling, streaming and comparing strategies.

use std::process::ExitCode;

use montepi::cli::{run_cli, Args, Verbosity};
use tracing_subscriber::EnvFilter;

fn setup_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        Verbosity::Quiet => EnvFilter::new("error"),
        Verbosity::Normal => EnvFilter::new("warn"),
        Verbosity::Verbose => EnvFilter::new("montepi=debug"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbosity);
    run_cli(args).await
}
