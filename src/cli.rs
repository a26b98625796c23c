// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `flowdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "flowdag",
    version,
    about = "Build a pipeline definition into a task graph and show its resolved schedule.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline definition (TOML).
    ///
    /// Default: `Flowdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Flowdag.toml")]
    pub config: String,

    /// Orchestrator backend to build with, overriding `[pipeline].orchestrator`.
    #[arg(long, value_name = "ID")]
    pub orchestrator: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FLOWDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
