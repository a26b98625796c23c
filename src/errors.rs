// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowdagError {
    #[error("No task group context found")]
    NoActiveScope,

    #[error("Dependency with id '{id}' already exists within group '{scope}'")]
    DuplicateId { id: String, scope: String },

    #[error("Either a schedule or dependencies must be provided")]
    MissingScheduleInput,

    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),

    #[error("Unknown orchestrator type: {0}")]
    UnknownOrchestrator(String),

    #[error("Dependency '{id}' is not registered in group '{scope}' or any parent group")]
    UnknownNode { id: String, scope: String },

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Dependency '{0}' is a task group, not a task")]
    NotATask(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FlowdagError>;
