// src/orchestration/backend.rs

//! Orchestrator backend abstraction.
//!
//! A backend decides how task handles become graph nodes and collects the
//! pipelines built for it. Turning a finished pipeline into a scheduler's
//! native DAG object is the backend's business, not this crate's.

use crate::dag::{GroupOptions, NodeRef, ScopeId, TaskGraph};
use crate::errors::Result;
use crate::pipeline::FinishedPipeline;

pub trait Orchestration<H> {
    /// Identifier this backend is registered under (e.g. `"airflow"`).
    fn orchestrator(&self) -> &str;

    /// Wrap `handle` as a task in `scope`. A missing handle creates nothing.
    fn create_task(
        &mut self,
        graph: &mut TaskGraph<H>,
        scope: ScopeId,
        id: &str,
        handle: Option<H>,
    ) -> Result<Option<NodeRef>> {
        wrap_task(graph, scope, id, handle)
    }

    /// Register a group in `scope` and return it with its nested scope.
    fn create_task_group(
        &mut self,
        graph: &mut TaskGraph<H>,
        scope: ScopeId,
        id: &str,
        options: GroupOptions,
    ) -> Result<(NodeRef, ScopeId)> {
        graph.add_group(scope, id, options)
    }

    /// Called once per pipeline when it is closed.
    fn register_pipeline(&mut self, pipeline: FinishedPipeline<H>);

    fn pipelines(&self) -> &[FinishedPipeline<H>];
}

/// Default task creation shared by backends and detached pipelines.
pub fn wrap_task<H>(
    graph: &mut TaskGraph<H>,
    scope: ScopeId,
    id: &str,
    handle: Option<H>,
) -> Result<Option<NodeRef>> {
    match handle {
        Some(handle) => graph.add_task(scope, id, handle).map(Some),
        None => Ok(None),
    }
}
