// src/pipeline/definition.rs

//! Populating a pipeline from a loaded [`ConfigFile`].
//!
//! Ungrouped tasks are declared in the outermost scope, grouped tasks inside
//! one nested scope per group. An `after` edge between two tasks of the same
//! group is declared inside that group; any other edge is declared in the
//! outermost scope, between the groups (or tasks) that contain its
//! endpoints.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::model::{ConfigFile, TaskConfig, TaskKind};
use crate::config::validate::edge_endpoints;
use crate::dag::{GroupOptions, NodeRef};
use crate::errors::Result;
use crate::pipeline::lifecycle::Pipeline;
use crate::schedule::Dataset;

impl<H, E> Pipeline<'_, H, E> {
    /// Declare every task and edge of `cfg`, then the optional start/end
    /// wrapping.
    pub fn populate(&mut self, cfg: &ConfigFile) -> Result<()> {
        let mut nodes: BTreeMap<&str, NodeRef> = BTreeMap::new();
        let mut groups: IndexMap<&str, NodeRef> = IndexMap::new();

        for (id, task) in cfg.task.iter().filter(|(_, t)| t.group.is_none()) {
            if let Some(node) = self.declare_configured(id, task)? {
                nodes.insert(id.as_str(), node);
            }
        }

        for group in cfg.groups() {
            let mut scope = self.group(group, GroupOptions::default())?;
            groups.insert(group, scope.node().clone());

            let members: Vec<_> = cfg
                .task
                .iter()
                .filter(|(_, t)| t.group.as_deref() == Some(group))
                .collect();
            for &(id, task) in &members {
                if let Some(node) = scope.declare_configured(id, task)? {
                    nodes.insert(id.as_str(), node);
                }
            }
            for &(id, task) in &members {
                for dep in task.after.iter() {
                    if let (Some(_), up, down) = edge_endpoints(&cfg.task, dep, id) {
                        if let (Some(up), Some(down)) = (nodes.get(up), nodes.get(down)) {
                            scope.before(up, down)?;
                        } else {
                            debug!(upstream = up, downstream = down, "skipping edge to declined task");
                        }
                    }
                }
            }
        }

        for (id, task) in cfg.task.iter() {
            for dep in task.after.iter() {
                if let (None, up, down) = edge_endpoints(&cfg.task, dep, id) {
                    let resolve = |key: &str| nodes.get(key).or_else(|| groups.get(key)).cloned();
                    match (resolve(up), resolve(down)) {
                        (Some(up), Some(down)) => {
                            self.before(&up, &down)?;
                        }
                        _ => debug!(upstream = up, downstream = down, "skipping edge to declined task"),
                    }
                }
            }
        }

        if cfg.pipeline.wrap {
            self.wrap(&cfg.pipeline.output_datasets)?;
        }
        Ok(())
    }

    /// `start >> roots`, `leaves >> end`, then `end >> trigger_least_frequent_datasets`
    /// when there is something to republish.
    fn wrap(&mut self, output_datasets: &[String]) -> Result<()> {
        let roots: Vec<NodeRef> = self.roots().into_iter().map(|n| n.to_ref()).collect();
        let leaves: Vec<NodeRef> = self.leaves().into_iter().map(|n| n.to_ref()).collect();
        let outputs = output_datasets
            .iter()
            .map(|uri| Dataset::new(uri, None))
            .collect::<Result<Vec<_>>>()?;

        let start = self.start_task(None)?;
        let end = self.end_task(None, &outputs)?;
        let trigger = self.trigger_least_frequent_datasets_task(None)?;

        if let Some(start) = &start {
            if roots.is_empty() {
                if let Some(end) = &end {
                    self.before(start, end)?;
                }
            } else {
                self.before_all(start, &roots)?;
            }
        }
        if let Some(end) = &end {
            self.after_all(end, &leaves)?;
            if let Some(trigger) = &trigger {
                self.before(end, trigger)?;
            }
        }
        Ok(())
    }

    fn declare_configured(&mut self, id: &str, task: &TaskConfig) -> Result<Option<NodeRef>> {
        let domain = task.domain.as_deref().unwrap_or_default();
        match task.kind {
            TaskKind::Dummy => self.dummy_task(id, Vec::new(), &[]),
            TaskKind::PreLoad => self.pre_load(domain, &task.tables, Some(id)),
            TaskKind::Import => self.import(Some(id), domain, &task.tables),
            TaskKind::Load => self.load(Some(id), domain, task.table.as_deref().unwrap_or_default()),
            TaskKind::Transform => {
                self.transform(Some(id), task.name.as_deref().unwrap_or(id), task.options.as_deref())
            }
        }
    }
}
