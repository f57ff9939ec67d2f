//! Turnstile - unified CLI entrypoint.
//!
//! Usage:
//!   turnstile check --config config/turnstile.toml
//!   turnstile simulate --config config/turnstile.toml --sessions 50 --cycles 20

use anyhow::Result;
use clap::Parser;
use turnstile::cli::commands::{run_check, run_simulate};
use turnstile::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Simulate(args) => run_simulate(args),
    }
}
