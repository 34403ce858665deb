mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use commands::{run_identify, run_replace, run_resolve};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replace(args) => {
            run_replace(args)?;
        }
        Commands::Resolve(args) => {
            run_resolve(args)?;
        }
        Commands::Identify(args) => {
            run_identify(args)?;
        }
    }

    Ok(())
}
