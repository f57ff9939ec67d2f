//! Turnstile CLI - command-line entry points.
//!
//! - `turnstile check` - validate a configuration file
//! - `turnstile simulate` - run cycles against a synthetic population

mod args;
pub mod commands;

pub use args::{CheckArgs, Cli, Commands, SimulateArgs};
