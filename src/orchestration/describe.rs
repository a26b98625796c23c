// src/orchestration/describe.rs

//! Built-in backend that only collects pipelines and renders them as text.
//! Used by the `flowdag` binary and handy in tests.

use std::fmt::Write;

use crate::orchestration::backend::Orchestration;
use crate::orchestration::registry::OrchestrationRegistry;
use crate::pipeline::FinishedPipeline;
use crate::schedule::Trigger;

pub const ORCHESTRATOR: &str = "describe";

pub fn register<H: 'static>(registry: &mut OrchestrationRegistry<H>) {
    registry.register(ORCHESTRATOR, || {
        Box::new(DescribeOrchestration::<H>::new()) as Box<dyn Orchestration<H>>
    });
}

#[derive(Debug)]
pub struct DescribeOrchestration<H> {
    pipelines: Vec<FinishedPipeline<H>>,
}

impl<H> Default for DescribeOrchestration<H> {
    fn default() -> Self {
        Self {
            pipelines: Vec::new(),
        }
    }
}

impl<H> DescribeOrchestration<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self) -> String {
        self.pipelines
            .iter()
            .map(render_pipeline)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl<H> Orchestration<H> for DescribeOrchestration<H> {
    fn orchestrator(&self) -> &str {
        ORCHESTRATOR
    }

    fn register_pipeline(&mut self, pipeline: FinishedPipeline<H>) {
        self.pipelines.push(pipeline);
    }

    fn pipelines(&self) -> &[FinishedPipeline<H>] {
        &self.pipelines
    }
}

/// Human-readable summary of one finished pipeline.
pub fn render_pipeline<H>(pipeline: &FinishedPipeline<H>) -> String {
    let schedule = pipeline.schedule();
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Pipeline {}:", pipeline.pipeline_id());
    match schedule.trigger() {
        Trigger::Cron(cron) => {
            let _ = writeln!(out, "  trigger: cron '{cron}'");
        }
        Trigger::Datasets(datasets) => {
            let _ = writeln!(out, "  trigger: datasets");
            for dataset in datasets {
                let _ = writeln!(out, "    - {}", dataset.url());
            }
        }
        Trigger::Manual => {
            let _ = writeln!(out, "  trigger: none (manual)");
        }
    }
    if !schedule.least_frequent_datasets.is_empty() {
        let _ = writeln!(out, "  republished:");
        for dataset in &schedule.least_frequent_datasets {
            let _ = writeln!(out, "    - {dataset}");
        }
    }
    let _ = writeln!(out, "  catchup: {}", schedule.catchup);
    if !schedule.tags.is_empty() {
        let _ = writeln!(out, "  tags: {}", schedule.tags.join(" "));
    }
    let _ = write!(out, "{}", pipeline.tree());
    out
}
