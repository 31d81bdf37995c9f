//! Geowrangle CLI - Command-line interface
//!
//! Thin adapter over the geowrangle crates: every subcommand maps to one
//! library operation.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod output;
mod output_types;

use clap::Parser;
use cli::Cli;
use console::style;
use errors::CliError;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = commands::execute(cli) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => cli_err.display(),
            None => eprintln!("{} {:#}", style("✗").red().bold(), err),
        }
        std::process::exit(1);
    }
}
