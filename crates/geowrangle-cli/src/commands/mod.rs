//! Command implementations

mod clip;
mod config;
#[cfg(feature = "gdb")]
mod extract_gdb;
mod plot;
mod show;
mod subset;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Subset(args) => subset::execute(args, config_path, &output),
        Commands::Clip(args) => clip::execute(args, config_path, &output),
        Commands::Plot(args) => plot::execute(args, config_path, &output),
        #[cfg(feature = "gdb")]
        Commands::ExtractGdb(args) => extract_gdb::execute(args, config_path, &output),
        Commands::Show(args) => show::execute(args, &output),
        Commands::Config => config::execute(config_path, &output),
    }
}
