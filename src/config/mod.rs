// src/config/mod.rs

//! Configuration for flowdag.
//!
//! Responsibilities:
//! - Pipeline context variables (`options.rs`).
//! - The TOML-backed pipeline definition (`model.rs`).
//! - Loading a definition from disk (`loader.rs`).
//! - Validating it before anything is built (`validate.rs`).

pub mod loader;
pub mod model;
pub mod options;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigFile, PipelineSection, RawConfigFile, TaskConfig, TaskKind};
pub use options::{EnvOptions, MapOptions, OptionsProvider, PipelineSettings};
pub use validate::validate_config;
