// src/pipeline/finished.rs

use crate::dag::{DependencyNode, TaskGraph};
use crate::schedule::{ResolvedSchedule, Trigger};

/// A closed pipeline: its graph is frozen and its scope stack is gone.
#[derive(Debug, Clone)]
pub struct FinishedPipeline<H> {
    pub(crate) pipeline_id: String,
    pub(crate) schedule: ResolvedSchedule,
    pub(crate) graph: TaskGraph<H>,
    pub(crate) tree: String,
}

impl<H> FinishedPipeline<H> {
    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn schedule(&self) -> &ResolvedSchedule {
        &self.schedule
    }

    pub fn trigger(&self) -> Trigger<'_> {
        self.schedule.trigger()
    }

    pub fn graph(&self) -> &TaskGraph<H> {
        &self.graph
    }

    pub fn roots(&self) -> Vec<&DependencyNode<H>> {
        self.graph.roots(self.graph.root())
    }

    pub fn leaves(&self) -> Vec<&DependencyNode<H>> {
        self.graph.leaves(self.graph.root())
    }

    /// Indented dependency tree rendered at close time.
    pub fn tree(&self) -> &str {
        &self.tree
    }

    pub fn into_graph(self) -> TaskGraph<H> {
        self.graph
    }
}
