#![warn(unused_extern_crates)]

mod cmd;
mod commands;
mod utils;

use clap::Parser;
use cmd::Cli;
use tracing_subscriber::EnvFilter;

fn default_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbose))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    commands::exec(cli.command)
        .await
        .map_err(|err| err.to_string())
}
