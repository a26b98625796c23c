// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod job;
pub mod logging;
pub mod orchestration;
pub mod pipeline;
pub mod schedule;
pub mod types;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::job::{CommandBuilder, DescribeJob, EventMapper};
use crate::orchestration::describe::render_pipeline;
use crate::orchestration::{Orchestration, OrchestrationRegistry};
use crate::pipeline::Pipeline;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - definition loading and validation
/// - orchestration selection through the registry
/// - pipeline construction
///
/// and returns the report of every pipeline the orchestration collected.
/// Nothing is executed.
pub fn run(args: CliArgs) -> Result<String> {
    let cfg = load_and_validate(&args.config)?;
    let orchestrator = args
        .orchestrator
        .as_deref()
        .unwrap_or(&cfg.pipeline.orchestrator);

    let registry = OrchestrationRegistry::<String>::with_builtin();
    let mut orchestration = registry.create(orchestrator)?;
    info!(config = %args.config, %orchestrator, "building pipeline");

    let job = DescribeJob;
    build_pipeline::<String, String>(&cfg, &job, &job, &mut *orchestration, Utc::now())?;

    Ok(report(&*orchestration))
}

/// Open a pipeline for `cfg`, populate it and close it into `orchestration`.
pub fn build_pipeline<H, E>(
    cfg: &ConfigFile,
    commands: &dyn CommandBuilder<E, Handle = H>,
    events: &dyn EventMapper<Event = E>,
    orchestration: &mut dyn Orchestration<H>,
    at: DateTime<Utc>,
) -> errors::Result<()> {
    let source = cfg.job_source();
    let options = cfg.map_options();
    let schedule = cfg.explicit_schedule();
    let dependencies = cfg.dependency_set();

    let mut builder = Pipeline::builder(&source, commands, events)
        .options(&options)
        .orchestration(orchestration)
        .at(at);
    if let Some(schedule) = &schedule {
        builder = builder.schedule(schedule);
    }
    if let Some(dependencies) = &dependencies {
        builder = builder.dependencies(dependencies);
    }

    let mut pipeline = builder.open()?;
    pipeline.populate(cfg)?;
    pipeline.close();
    Ok(())
}

/// Render every pipeline collected by `orchestration`.
pub fn report<H>(orchestration: &dyn Orchestration<H>) -> String {
    let pipelines = orchestration.pipelines();
    debug!(count = pipelines.len(), "rendering pipelines");
    pipelines
        .iter()
        .map(render_pipeline)
        .collect::<Vec<_>>()
        .join("\n\n")
}
