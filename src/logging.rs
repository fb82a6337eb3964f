//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Filter priority:
//! 1. `--verbose` (debug for this crate)
//! 2. `WFRELAY_LOG`, then `RUST_LOG`
//! 3. `info`
//!
//! Output goes to stderr so `--json` results on stdout stay parseable.

use anyhow::{Result, anyhow};
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "WFRELAY_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(verbose: bool, format: LogFormat) -> Result<()> {
    let directives = filter_directives(
        verbose,
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", directives, e))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}

fn filter_directives(verbose: bool, own: Option<String>, rust_log: Option<String>) -> String {
    if verbose {
        return "wfrelay=debug,info".to_string();
    }
    own.or(rust_log)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "info".to_string())
}
