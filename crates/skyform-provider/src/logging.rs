//! Tracing setup for hosts embedding the provider
//!
//! The level comes from `SKYFORM_LOG` (`trace`, `debug`, `info`, `warn` or
//! `error`), defaulting to `info`.

use anyhow::{Context, bail};
use std::env;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Environment variable holding the log level
pub const LOG_ENV: &str = "SKYFORM_LOG";

/// Parse a log level name, case-insensitively
pub fn parse_level(value: &str) -> anyhow::Result<Level> {
    let level = match value.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => bail!(
            "{LOG_ENV} '{other}' is not valid. Valid levels: trace, debug, info, warn, error"
        ),
    };
    Ok(level)
}

/// Install the global subscriber
///
/// Fails if the level is invalid or a global subscriber is already set.
pub fn init() -> anyhow::Result<()> {
    let level = match env::var(LOG_ENV) {
        Ok(value) => parse_level(&value)?,
        Err(_) => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}
