// src/job.rs

//! Capabilities the pipeline needs from the job that produces concrete
//! scheduler tasks.
//!
//! The job itself (shell/operator generation, retries, CLI arguments) lives
//! outside this crate; it plugs in through these traits:
//! - [`CommandBuilder`] turns logical operations into opaque task handles.
//! - [`EventMapper`] turns datasets into scheduler-native events.
//! - [`OptionsProvider`](crate::config::OptionsProvider) supplies context
//!   variables.
//! - [`JobSource`] identifies the definition the pipeline comes from.

use std::path::Path;

use indexmap::IndexSet;

use crate::schedule::Dataset;
use crate::types::PreLoadStrategy;

/// Where a pipeline definition comes from, plus what it declared about its
/// own trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSource {
    /// File (or module) name of the definition, e.g. `sales_load.py`.
    pub filename: String,
    /// Raw cron declared next to the definition; `"none"` means absent.
    pub cron: Option<String>,
    /// Upstream dataset URIs that must never trigger this pipeline.
    pub filtered_datasets: IndexSet<String>,
}

impl JobSource {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn with_cron(mut self, cron: impl Into<String>) -> Self {
        self.cron = Some(cron.into());
        self
    }

    pub fn with_filtered_dataset(mut self, uri: impl Into<String>) -> Self {
        self.filtered_datasets.insert(uri.into());
        self
    }

    /// File name without its extension, lower-cased.
    pub fn base_id(&self) -> String {
        let path = Path::new(&self.filename);
        let stem = match path.extension() {
            Some(_) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.filename.clone()),
            None => self.filename.clone(),
        };
        stem.to_lowercase()
    }
}

/// Maps datasets to the events a scheduler publishes or waits on.
pub trait EventMapper {
    type Event;

    /// `source` is the id of the pipeline emitting the event, when known.
    fn to_event(&self, dataset: &Dataset, source: Option<&str>) -> Self::Event;
}

/// Produces scheduler-native task handles.
///
/// Every method may decline by returning `None`; the pipeline then creates
/// no node and reports no error.
pub trait CommandBuilder<E> {
    type Handle;

    /// A no-op task, optionally emitting `events` on success.
    fn dummy_op(&self, task_id: &str, events: Vec<E>) -> Option<Self::Handle>;

    /// Readiness check for `domain` according to `strategy`.
    fn pre_load(
        &self,
        task_id: &str,
        domain: &str,
        tables: &[String],
        strategy: PreLoadStrategy,
    ) -> Option<Self::Handle>;

    fn import(&self, task_id: &str, domain: &str, tables: &[String]) -> Option<Self::Handle>;

    fn load(&self, task_id: &str, domain: &str, table: &str) -> Option<Self::Handle>;

    fn transform(&self, task_id: &str, name: &str, options: Option<&str>) -> Option<Self::Handle>;

    /// Gate that skips downstream work unless `upstream` succeeded.
    fn skip_or_start(&self, _task_id: &str, _upstream: &Self::Handle) -> Option<Self::Handle> {
        None
    }

    fn pre_tasks(&self, _task_id: &str) -> Option<Self::Handle> {
        None
    }

    fn post_tasks(&self, _task_id: &str) -> Option<Self::Handle> {
        None
    }
}

/// Job rendering every operation as the command line it stands for. Used by
/// the `flowdag` binary to show what a pipeline would run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescribeJob;

impl EventMapper for DescribeJob {
    type Event = String;

    fn to_event(&self, dataset: &Dataset, source: Option<&str>) -> String {
        match source {
            Some(source) => format!("{} (from {source})", dataset.url()),
            None => dataset.url(),
        }
    }
}

impl CommandBuilder<String> for DescribeJob {
    type Handle = String;

    fn dummy_op(&self, _task_id: &str, events: Vec<String>) -> Option<String> {
        if events.is_empty() {
            Some("noop".to_string())
        } else {
            Some(format!("noop --publish {}", events.join(",")))
        }
    }

    fn pre_load(
        &self,
        _task_id: &str,
        domain: &str,
        tables: &[String],
        strategy: PreLoadStrategy,
    ) -> Option<String> {
        if strategy == PreLoadStrategy::None {
            return None;
        }
        Some(format!(
            "preload --domain {domain} --tables {} --strategy {strategy}",
            tables.join(",")
        ))
    }

    fn import(&self, _task_id: &str, domain: &str, tables: &[String]) -> Option<String> {
        Some(format!("stage --domains {domain} --tables {}", tables.join(",")))
    }

    fn load(&self, _task_id: &str, domain: &str, table: &str) -> Option<String> {
        Some(format!("load --domains {domain} --tables {table}"))
    }

    fn transform(&self, _task_id: &str, name: &str, options: Option<&str>) -> Option<String> {
        match options {
            Some(options) => Some(format!("transform --name {name} --options {options}")),
            None => Some(format!("transform --name {name}")),
        }
    }

    fn skip_or_start(&self, _task_id: &str, upstream: &String) -> Option<String> {
        Some(format!("skip_or_start --upstream '{upstream}'"))
    }
}
