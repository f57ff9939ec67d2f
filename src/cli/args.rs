//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Turnstile - priority-queue admission gateway tooling.
#[derive(Parser)]
#[command(name = "turnstile")]
#[command(version)]
#[command(about = "Turnstile queue engine and diagnostic tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a configuration file and print the tier layout
    Check(CheckArgs),

    /// Run promotion cycles against a synthetic in-memory population
    Simulate(SimulateArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/turnstile.toml")]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/turnstile.toml")]
    pub config: PathBuf,

    /// Number of synthetic sessions arriving at once
    #[arg(long, default_value_t = 20)]
    pub sessions: usize,

    /// Number of promotion cycles to run
    #[arg(long, default_value_t = 10)]
    pub cycles: usize,

    /// Log filter, e.g. "debug" or "turnstile=trace"
    #[arg(long)]
    pub log_level: Option<String>,
}
