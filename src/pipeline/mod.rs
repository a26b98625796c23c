// src/pipeline/mod.rs

//! A buildable unit: one root scope, one resolved schedule, and the job
//! capabilities that produce its tasks.
//!
//! - [`lifecycle`]: opening, groups, edges, closing.
//! - [`tasks`]: standard lifecycle task helpers.
//! - [`definition`]: populating from a TOML pipeline definition.
//! - [`finished`]: the frozen result handed to an orchestration.

pub mod definition;
pub mod finished;
pub mod lifecycle;
pub mod tasks;

pub use finished::FinishedPipeline;
pub use lifecycle::{Pipeline, PipelineBuilder, PipelineGroup};
