use std::process::ExitCode;

use clap::Parser;
use notate::cli::{Arguments, ExitStatus};
use tracing_subscriber::EnvFilter;

/// Overrides the log filter, e.g. `NOTATE_LOG=notate=trace`.
const LOG_ENV: &str = "NOTATE_LOG";

fn main() -> ExitCode {
    let args = Arguments::parse();
    init_tracing(args.verbose());

    match notate::cli::run_cli(args) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitStatus::Error.into()
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "notate=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
