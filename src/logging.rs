// src/logging.rs

//! Diagnostics for kapo itself.
//!
//! kapo never writes to stdout: run and supervise children inherit it, so
//! their output reaches whoever started kapo unmixed. All of kapo's own
//! events go to stderr.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` applies one level to every target.
//! 2. `KAPO_LOG` takes full `EnvFilter` directives, e.g.
//!    `kapo=debug,axum=warn`.
//! 3. `info`.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "KAPO_LOG";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(cli_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialise logging")
}

/// The filter `init_logging` installs.
pub fn filter_for(cli_level: Option<LogLevel>) -> EnvFilter {
    match cli_level {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
