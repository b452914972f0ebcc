//! magpie CLI entrypoint.

use std::process::ExitCode;

use clap::Parser;
use magpie::MagpieConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = MagpieConfig::parse();
    ExitCode::from(magpie::cli::run(&config).await)
}
