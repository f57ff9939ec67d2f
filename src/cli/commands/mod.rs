mod check;
mod simulate;

pub use check::run_check;
pub use simulate::run_simulate;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize console logging with an optional filter override.
pub fn init_tracing(log_level: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_new(log_level.unwrap_or("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init tracing: {e}"))
}
