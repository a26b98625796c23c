// src/logging.rs

//! Structured logging for the `flowdag` binary.
//!
//! The filter is an [`EnvFilter`]:
//! - `--log-level` sets a single global level and ignores the environment;
//! - otherwise `FLOWDAG_LOG` is read as filter directives, so per-module
//!   levels work (`FLOWDAG_LOG="info,flowdag::dag=debug"`);
//! - without either, everything at `info` and above is shown.
//!
//! Output goes to STDERR; stdout is reserved for the pipeline report.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Variable holding filter directives when no CLI level is given.
pub const LOG_ENV: &str = "FLOWDAG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Call once, before any pipeline is built.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

/// Filter for a CLI level or, failing that, the raw `FLOWDAG_LOG` value.
///
/// Malformed directives in the environment are an error rather than being
/// silently dropped.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(level.as_directive()));
    }
    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} value: {directives}")),
        None => Ok(EnvFilter::new(DEFAULT_DIRECTIVE)),
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
