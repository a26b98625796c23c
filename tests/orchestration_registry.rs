// tests/orchestration_registry.rs

mod common;
use crate::common::recording::RecordingJob;
use crate::common::reference_time;

use std::error::Error;

use flowdag::dag::{GroupOptions, NodeRef, ScopeId, TaskGraph};
use flowdag::errors::FlowdagError;
use flowdag::job::JobSource;
use flowdag::orchestration::{Orchestration, OrchestrationRegistry};
use flowdag::pipeline::{FinishedPipeline, Pipeline};
use flowdag::schedule::Schedule;

type TestResult = Result<(), Box<dyn Error>>;

/// Backend that prefixes every task id and counts the groups it opened.
#[derive(Default)]
struct PrefixingOrchestration {
    groups: usize,
    pipelines: Vec<FinishedPipeline<String>>,
}

impl Orchestration<String> for PrefixingOrchestration {
    fn orchestrator(&self) -> &str {
        "prefixing"
    }

    fn create_task(
        &mut self,
        graph: &mut TaskGraph<String>,
        scope: ScopeId,
        id: &str,
        handle: Option<String>,
    ) -> flowdag::errors::Result<Option<NodeRef>> {
        match handle {
            Some(handle) => graph.add_task(scope, format!("x_{id}"), handle).map(Some),
            None => Ok(None),
        }
    }

    fn create_task_group(
        &mut self,
        graph: &mut TaskGraph<String>,
        scope: ScopeId,
        id: &str,
        options: GroupOptions,
    ) -> flowdag::errors::Result<(NodeRef, ScopeId)> {
        self.groups += 1;
        graph.add_group(scope, id, options)
    }

    fn register_pipeline(&mut self, pipeline: FinishedPipeline<String>) {
        self.pipelines.push(pipeline);
    }

    fn pipelines(&self) -> &[FinishedPipeline<String>] {
        &self.pipelines
    }
}

#[test]
fn unknown_orchestrator_fails() {
    let registry = OrchestrationRegistry::<String>::with_builtin();
    match registry.create("airflow") {
        Err(FlowdagError::UnknownOrchestrator(id)) => assert_eq!(id, "airflow"),
        Err(other) => panic!("expected UnknownOrchestrator, got {other:?}"),
        Ok(_) => panic!("expected an error"),
    }
}

#[test]
fn builtin_registry_knows_describe() -> TestResult {
    let registry = OrchestrationRegistry::<String>::with_builtin();
    assert!(registry.contains("describe"));
    let backend = registry.create("describe")?;
    assert_eq!(backend.orchestrator(), "describe");
    assert!(backend.pipelines().is_empty());
    Ok(())
}

#[test]
fn registered_backends_create_the_nodes() -> TestResult {
    let mut registry = OrchestrationRegistry::<String>::with_builtin();
    registry.register("prefixing", || Box::new(PrefixingOrchestration::default()));
    let ids: Vec<_> = registry.orchestrators().collect();
    assert_eq!(ids, vec!["describe", "prefixing"]);

    let mut backend = registry.create("prefixing")?;
    let job = RecordingJob::new();
    let source = JobSource::new("sales_load.py");
    let schedule = Schedule::new(None, Some("@daily"), vec![]);
    let options = flowdag::config::MapOptions::new();

    let mut pipeline = Pipeline::<String, String>::builder(&source, &job, &job)
        .options(&options)
        .schedule(&schedule)
        .orchestration(&mut *backend)
        .at(reference_time())
        .open()?;
    let start = pipeline.start_task(None)?.expect("start");
    assert_eq!(start.id(), "x_start");
    pipeline.with_group("sales", GroupOptions::default(), |p| p.load(None, "sales", "orders"))?;
    assert!(pipeline.close().is_none());

    let finished = &backend.pipelines()[0];
    let tasks: Vec<_> = finished.graph().tasks().iter().map(|t| t.id.clone()).collect();
    assert_eq!(tasks, vec!["x_start", "x_load_sales_orders"]);
    Ok(())
}
