//! Core infrastructure: configuration, engine assembly, time.

pub mod config;
pub mod runtime;
pub mod time;

pub use config::Config;
pub use runtime::{Runtime, RuntimeInputs};
pub use time::{Clock, SystemClock};
