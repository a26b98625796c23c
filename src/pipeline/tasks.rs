// src/pipeline/tasks.rs

//! Standard lifecycle tasks a pipeline offers while it is being populated.
//!
//! Every helper asks the job's [`CommandBuilder`](crate::job::CommandBuilder)
//! for a handle and wraps it through [`Pipeline::task`]. When the job
//! declines, no node is created and `Ok(None)` is returned.

use tracing::debug;

use crate::dag::NodeRef;
use crate::errors::Result;
use crate::pipeline::lifecycle::Pipeline;
use crate::schedule::Dataset;
use crate::types::PreLoadStrategy;

pub const START_TASK_ID: &str = "start";
pub const END_TASK_ID: &str = "end";
pub const PRE_TASKS_ID: &str = "pre_tasks";
pub const POST_TASKS_ID: &str = "post_tasks";
pub const TRIGGER_LEAST_FREQUENT_TASK_ID: &str = "trigger_least_frequent_datasets";

impl<H, E> Pipeline<'_, H, E> {
    /// No-op task publishing `events` plus one event per output dataset,
    /// sourced from this pipeline.
    pub fn dummy_task(
        &mut self,
        task_id: &str,
        mut events: Vec<E>,
        output_datasets: &[Dataset],
    ) -> Result<Option<NodeRef>> {
        events.extend(
            output_datasets
                .iter()
                .map(|d| self.events.to_event(d, Some(&self.pipeline_id))),
        );
        let handle = self.commands.dummy_op(task_id, events);
        self.task(task_id, handle)
    }

    pub fn start_task(&mut self, task_id: Option<&str>) -> Result<Option<NodeRef>> {
        self.dummy_task(task_id.unwrap_or(START_TASK_ID), Vec::new(), &[])
    }

    /// Final marker, publishing `output_datasets` on success.
    pub fn end_task(
        &mut self,
        task_id: Option<&str>,
        output_datasets: &[Dataset],
    ) -> Result<Option<NodeRef>> {
        self.dummy_task(task_id.unwrap_or(END_TASK_ID), Vec::new(), output_datasets)
    }

    /// Re-emits the slower-cadence triggering datasets. Only created when
    /// there is something to republish.
    pub fn trigger_least_frequent_datasets_task(
        &mut self,
        task_id: Option<&str>,
    ) -> Result<Option<NodeRef>> {
        if self.schedule.least_frequent_datasets.is_empty() {
            debug!(pipeline = %self.pipeline_id, "no least frequent datasets to republish");
            return Ok(None);
        }
        let datasets = self.schedule.least_frequent_datasets.clone();
        self.dummy_task(
            task_id.unwrap_or(TRIGGER_LEAST_FREQUENT_TASK_ID),
            Vec::new(),
            &datasets,
        )
    }

    pub fn pre_tasks(&mut self, task_id: Option<&str>) -> Result<Option<NodeRef>> {
        let task_id = task_id.unwrap_or(PRE_TASKS_ID);
        let handle = self.commands.pre_tasks(task_id);
        self.task(task_id, handle)
    }

    pub fn post_tasks(&mut self, task_id: Option<&str>) -> Result<Option<NodeRef>> {
        let task_id = task_id.unwrap_or(POST_TASKS_ID);
        let handle = self.commands.post_tasks(task_id);
        self.task(task_id, handle)
    }

    /// Readiness check for `domain`, according to the configured pre-load
    /// strategy. Nothing is created for [`PreLoadStrategy::None`].
    pub fn pre_load(
        &mut self,
        domain: &str,
        tables: &[String],
        task_id: Option<&str>,
    ) -> Result<Option<NodeRef>> {
        let strategy = self.settings.pre_load_strategy;
        if strategy == PreLoadStrategy::None {
            return Ok(None);
        }
        let task_id = task_id.map_or_else(|| strategy.task_id(domain), str::to_string);
        let handle = self.commands.pre_load(&task_id, domain, tables, strategy);
        self.task(&task_id, handle)
    }

    /// Gate that lets downstream tasks run only when `upstream` succeeded.
    /// `upstream` must be a task.
    pub fn skip_or_start(&mut self, task_id: &str, upstream: &NodeRef) -> Result<Option<NodeRef>> {
        let scope = self.builder.current_scope()?;
        let handle = {
            let upstream_handle = self.builder.graph().handle(scope, upstream.id())?;
            self.commands.skip_or_start(task_id, upstream_handle)
        };
        self.task(task_id, handle)
    }

    /// Import `tables` of `domain`; id defaults to `import_{domain}`.
    pub fn import(
        &mut self,
        task_id: Option<&str>,
        domain: &str,
        tables: &[String],
    ) -> Result<Option<NodeRef>> {
        let task_id = task_id.map_or_else(|| format!("import_{domain}"), str::to_string);
        let handle = self.commands.import(&task_id, domain, tables);
        self.task(&task_id, handle)
    }

    /// Load one table; id defaults to `load_{domain}_{table}`.
    pub fn load(&mut self, task_id: Option<&str>, domain: &str, table: &str) -> Result<Option<NodeRef>> {
        let task_id = task_id.map_or_else(|| format!("load_{domain}_{table}"), str::to_string);
        let handle = self.commands.load(&task_id, domain, table);
        self.task(&task_id, handle)
    }

    /// Run transform `name`; id defaults to the transform name.
    pub fn transform(
        &mut self,
        task_id: Option<&str>,
        name: &str,
        options: Option<&str>,
    ) -> Result<Option<NodeRef>> {
        let task_id = task_id.unwrap_or(name);
        let handle = self.commands.transform(task_id, name, options);
        self.task(task_id, handle)
    }
}
