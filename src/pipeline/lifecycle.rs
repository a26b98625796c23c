// src/pipeline/lifecycle.rs

//! Pipeline state machine: `Opening -> Populating -> Closed`.
//!
//! - Opening is [`PipelineBuilder::open`]: the schedule is resolved once and
//!   the root scope is pushed.
//! - Populating is any use of the returned [`Pipeline`].
//! - Closed is [`Pipeline::close`], which consumes the pipeline.
//!
//! Nested groups are opened through [`PipelineGroup`] guards, so every scope
//! pushed while populating is popped again on every exit path.

use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::options::{EnvOptions, OptionsProvider, PipelineSettings};
use crate::dag::{DependencyNode, GraphBuilder, GroupOptions, NodeRef, ScopeId, TaskGraph, render_tree};
use crate::errors::{FlowdagError, Result};
use crate::job::{CommandBuilder, EventMapper, JobSource};
use crate::orchestration::{Orchestration, wrap_task};
use crate::pipeline::finished::FinishedPipeline;
use crate::schedule::cron::cron_start_end_dates;
use crate::schedule::{Dataset, DependencySet, ResolvedSchedule, Schedule, ScheduleResolver, Trigger};
use crate::types::PreLoadStrategy;

/// Collects what a pipeline is opened with.
pub struct PipelineBuilder<'a, H, E> {
    source: &'a JobSource,
    commands: &'a dyn CommandBuilder<E, Handle = H>,
    events: &'a dyn EventMapper<Event = E>,
    options: Option<&'a dyn OptionsProvider>,
    schedule: Option<&'a Schedule>,
    dependencies: Option<&'a dyn DependencySet>,
    orchestration: Option<&'a mut dyn Orchestration<H>>,
    at: Option<DateTime<Utc>>,
}

impl<'a, H, E> PipelineBuilder<'a, H, E> {
    /// Context variables; the process environment when not set.
    pub fn options(mut self, options: &'a dyn OptionsProvider) -> Self {
        self.options = Some(options);
        self
    }

    /// Explicit schedule. Takes precedence over a dependency set.
    pub fn schedule(mut self, schedule: &'a Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn dependencies(mut self, dependencies: &'a dyn DependencySet) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    /// Backend the pipeline creates its nodes through and registers with on
    /// close.
    pub fn orchestration(mut self, orchestration: &'a mut dyn Orchestration<H>) -> Self {
        self.orchestration = Some(orchestration);
        self
    }

    /// Reference time for cron comparisons and schedule stamps. Defaults to
    /// now.
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = Some(at);
        self
    }

    /// Resolve the schedule and push the root scope.
    pub fn open(self) -> Result<Pipeline<'a, H, E>> {
        if self.schedule.is_none() && self.dependencies.is_none() {
            return Err(FlowdagError::MissingScheduleInput);
        }

        let settings = match self.options {
            Some(options) => PipelineSettings::from_options(options)?,
            None => PipelineSettings::from_options(&EnvOptions)?,
        };
        let at = self.at.unwrap_or_else(Utc::now);

        let mut pipeline_id = self.source.base_id();
        if let Some(name) = self.schedule.and_then(|s| s.name()) {
            pipeline_id = format!("{pipeline_id}_{name}");
        }

        let schedule = ScheduleResolver::new(&settings, at).resolve(
            self.schedule,
            self.dependencies,
            self.source,
        )?;

        let mut builder = GraphBuilder::new(pipeline_id.clone());
        let root = builder.graph().root();
        builder.push_scope(root);

        info!(
            pipeline = %pipeline_id,
            orchestrator = self.orchestration.as_ref().map(|o| o.orchestrator()),
            "opened pipeline"
        );

        Ok(Pipeline {
            pipeline_id,
            builder,
            schedule,
            settings,
            commands: self.commands,
            events: self.events,
            orchestration: self.orchestration,
            at,
        })
    }
}

/// A pipeline being populated.
///
/// Owns its graph and its scope stack; borrows the job capabilities and,
/// optionally, the orchestration it registers with on close. One pipeline is
/// built by one thread; independent pipelines never share a stack.
pub struct Pipeline<'a, H, E> {
    pub(crate) pipeline_id: String,
    pub(crate) builder: GraphBuilder<H>,
    pub(crate) schedule: ResolvedSchedule,
    pub(crate) settings: PipelineSettings,
    pub(crate) commands: &'a dyn CommandBuilder<E, Handle = H>,
    pub(crate) events: &'a dyn EventMapper<Event = E>,
    pub(crate) orchestration: Option<&'a mut dyn Orchestration<H>>,
    pub(crate) at: DateTime<Utc>,
}

impl<'a, H, E> Pipeline<'a, H, E> {
    pub fn builder(
        source: &'a JobSource,
        commands: &'a dyn CommandBuilder<E, Handle = H>,
        events: &'a dyn EventMapper<Event = E>,
    ) -> PipelineBuilder<'a, H, E> {
        PipelineBuilder {
            source,
            commands,
            events,
            options: None,
            schedule: None,
            dependencies: None,
            orchestration: None,
            at: None,
        }
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn schedule(&self) -> &ResolvedSchedule {
        &self.schedule
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn trigger(&self) -> Trigger<'_> {
        self.schedule.trigger()
    }

    pub fn tags(&self) -> &[String] {
        &self.schedule.tags
    }

    pub fn cron(&self) -> Option<&str> {
        self.schedule.cron.as_deref()
    }

    pub fn catchup(&self) -> bool {
        self.schedule.catchup
    }

    pub fn load_dependencies(&self) -> Option<bool> {
        self.schedule.load_dependencies
    }

    pub fn triggering_datasets(&self) -> Option<&[Dataset]> {
        self.schedule.triggering_datasets.as_deref()
    }

    pub fn least_frequent_datasets(&self) -> &[Dataset] {
        &self.schedule.least_frequent_datasets
    }

    pub fn pre_load_strategy(&self) -> PreLoadStrategy {
        self.settings.pre_load_strategy
    }

    /// Triggering datasets as scheduler events.
    pub fn events(&self) -> Vec<E> {
        self.triggering_datasets()
            .unwrap_or_default()
            .iter()
            .map(|d| self.events.to_event(d, None))
            .collect()
    }

    /// Start/end dates of the previous `cron` interval, or of the pipeline's
    /// own cron when none is given. `None` without any cron.
    pub fn transform_options(&self, cron: Option<&str>) -> Result<Option<String>> {
        match cron.or(self.cron()) {
            Some(cron) => cron_start_end_dates(cron, self.at).map(Some),
            None => Ok(None),
        }
    }

    /// Number of scopes currently open, the root included.
    pub fn depth(&self) -> usize {
        self.builder.depth()
    }

    pub fn current_scope(&self) -> Result<ScopeId> {
        self.builder.current_scope()
    }

    pub fn graph(&self) -> &TaskGraph<H> {
        self.builder.graph()
    }

    /// Roots of the pipeline's own (outermost) scope.
    pub fn roots(&self) -> Vec<&DependencyNode<H>> {
        let graph = self.builder.graph();
        graph.roots(graph.root())
    }

    /// Leaves of the pipeline's own (outermost) scope.
    pub fn leaves(&self) -> Vec<&DependencyNode<H>> {
        let graph = self.builder.graph();
        graph.leaves(graph.root())
    }

    /// Wrap `handle` as a task in the current scope, through the attached
    /// orchestration when there is one.
    pub fn task(&mut self, id: &str, handle: Option<H>) -> Result<Option<NodeRef>> {
        let scope = self.builder.current_scope()?;
        let graph = self.builder.graph_mut();
        match self.orchestration.as_mut() {
            Some(orchestration) => orchestration.create_task(graph, scope, id, handle),
            None => wrap_task(graph, scope, id, handle),
        }
    }

    /// Register a group in the current scope and open its nested scope.
    pub fn group(&mut self, id: &str, options: GroupOptions) -> Result<PipelineGroup<'_, 'a, H, E>> {
        let scope = self.builder.current_scope()?;
        let graph = self.builder.graph_mut();
        let (node, nested) = match self.orchestration.as_mut() {
            Some(orchestration) => orchestration.create_task_group(graph, scope, id, options)?,
            None => graph.add_group(scope, id, options)?,
        };
        self.builder.push_scope(nested);
        Ok(PipelineGroup {
            pipeline: self,
            scope: nested,
            node,
        })
    }

    /// Run `f` inside a nested group. The group is closed on every path out
    /// of `f`.
    pub fn with_group<R>(
        &mut self,
        id: &str,
        options: GroupOptions,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<(NodeRef, R)> {
        let mut group = self.group(id, options)?;
        let node = group.node().clone();
        let out = f(&mut *group)?;
        Ok((node, out))
    }

    pub fn before(&mut self, upstream: &NodeRef, downstream: &NodeRef) -> Result<NodeRef> {
        self.builder.before(upstream, downstream)
    }

    pub fn before_all(&mut self, upstream: &NodeRef, downstream: &[NodeRef]) -> Result<Vec<NodeRef>> {
        self.builder.before_all(upstream, downstream)
    }

    pub fn after(&mut self, downstream: &NodeRef, upstream: &NodeRef) -> Result<NodeRef> {
        self.builder.after(downstream, upstream)
    }

    pub fn after_all(&mut self, downstream: &NodeRef, upstream: &[NodeRef]) -> Result<Vec<NodeRef>> {
        self.builder.after_all(downstream, upstream)
    }

    /// Freeze the graph, log its tree and hand it over.
    ///
    /// With an orchestration attached the finished pipeline is registered
    /// there and `None` is returned; otherwise it is returned to the caller.
    pub fn close(self) -> Option<FinishedPipeline<H>> {
        let Pipeline {
            pipeline_id,
            mut builder,
            schedule,
            orchestration,
            ..
        } = self;

        let root = builder.graph().root();
        builder.pop_scope(root);

        let graph = builder.into_graph();
        if graph.roots(root).is_empty() {
            warn!(pipeline = %pipeline_id, "closing pipeline without any root task");
        }
        let tree = render_tree(&graph, root, 0);
        info!(pipeline = %pipeline_id, "closed pipeline\n{tree}");

        let finished = FinishedPipeline {
            pipeline_id,
            schedule,
            graph,
            tree,
        };
        match orchestration {
            Some(orchestration) => {
                debug!(
                    pipeline = %finished.pipeline_id,
                    orchestrator = orchestration.orchestrator(),
                    "registering pipeline"
                );
                orchestration.register_pipeline(finished);
                None
            }
            None => Some(finished),
        }
    }
}

/// An open nested group. Derefs to the pipeline; pops its scope when dropped.
pub struct PipelineGroup<'p, 'a, H, E> {
    pipeline: &'p mut Pipeline<'a, H, E>,
    scope: ScopeId,
    node: NodeRef,
}

impl<H, E> PipelineGroup<'_, '_, H, E> {
    /// The group's node in the enclosing scope.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl<'a, H, E> Deref for PipelineGroup<'_, 'a, H, E> {
    type Target = Pipeline<'a, H, E>;

    fn deref(&self) -> &Self::Target {
        &*self.pipeline
    }
}

impl<'a, H, E> DerefMut for PipelineGroup<'_, 'a, H, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.pipeline
    }
}

impl<H, E> Drop for PipelineGroup<'_, '_, H, E> {
    fn drop(&mut self) {
        self.pipeline.builder.pop_scope(self.scope);
    }
}
