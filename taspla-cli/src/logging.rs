use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Env var that overrides the `-v` derived level, e.g. `TASPLA_LOG=taspla_core=trace`.
pub const LOG_ENV: &str = "TASPLA_LOG";

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Log to stderr so stdout stays clean for task output.
pub fn init_logging(verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("init logging: {e}"))
}
