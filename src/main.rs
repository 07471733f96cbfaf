#![allow(dead_code)]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use std::process::ExitCode;

use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // stdout carries the JSON result; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agro_advisor=info")),
        )
        .init();

    let status = Cli::run_args(std::env::args_os(), &mut std::io::stdout().lock());
    ExitCode::from(status)
}
