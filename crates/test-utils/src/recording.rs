//! A fake job that hands out its own call log entries as task handles.

use std::cell::RefCell;
use std::collections::BTreeSet;

use flowdag::job::{CommandBuilder, EventMapper};
use flowdag::schedule::Dataset;
use flowdag::types::PreLoadStrategy;

/// Records every call and returns a descriptive `String` handle, unless the
/// task id was declined with [`RecordingJob::declining`].
#[derive(Debug, Default)]
pub struct RecordingJob {
    calls: RefCell<Vec<String>>,
    declined: BTreeSet<String>,
}

impl RecordingJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation for `task_id` return no handle.
    pub fn declining(mut self, task_id: &str) -> Self {
        self.declined.insert(task_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, task_id: &str, call: String) -> Option<String> {
        self.calls.borrow_mut().push(call.clone());
        if self.declined.contains(task_id) {
            None
        } else {
            Some(call)
        }
    }
}

impl EventMapper for RecordingJob {
    type Event = String;

    fn to_event(&self, dataset: &Dataset, source: Option<&str>) -> String {
        match source {
            Some(source) => format!("{}<-{source}", dataset.uri()),
            None => dataset.uri().to_string(),
        }
    }
}

impl CommandBuilder<String> for RecordingJob {
    type Handle = String;

    fn dummy_op(&self, task_id: &str, events: Vec<String>) -> Option<String> {
        self.record(task_id, format!("dummy:{task_id}[{}]", events.join(",")))
    }

    fn pre_load(
        &self,
        task_id: &str,
        domain: &str,
        tables: &[String],
        strategy: PreLoadStrategy,
    ) -> Option<String> {
        if strategy == PreLoadStrategy::None {
            return None;
        }
        self.record(
            task_id,
            format!("pre_load:{task_id}:{domain}[{}]:{strategy}", tables.join(",")),
        )
    }

    fn import(&self, task_id: &str, domain: &str, tables: &[String]) -> Option<String> {
        self.record(task_id, format!("import:{task_id}:{domain}[{}]", tables.join(",")))
    }

    fn load(&self, task_id: &str, domain: &str, table: &str) -> Option<String> {
        self.record(task_id, format!("load:{task_id}:{domain}.{table}"))
    }

    fn transform(&self, task_id: &str, name: &str, options: Option<&str>) -> Option<String> {
        self.record(
            task_id,
            format!("transform:{task_id}:{name}:{}", options.unwrap_or("")),
        )
    }

    fn skip_or_start(&self, task_id: &str, upstream: &String) -> Option<String> {
        self.record(task_id, format!("skip_or_start:{task_id}<{upstream}>"))
    }

    fn pre_tasks(&self, task_id: &str) -> Option<String> {
        self.record(task_id, format!("pre_tasks:{task_id}"))
    }
}
