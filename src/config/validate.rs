// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig, TaskKind};
use crate::errors::{FlowdagError, Result};
use crate::schedule::cron::declared_cron;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = FlowdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let options = stringify_options(&raw.options)?;
        Ok(ConfigFile::new_unchecked(
            raw.pipeline,
            options,
            raw.schedule,
            raw.dependencies,
            raw.task,
        ))
    }
}

/// Run every semantic check on an already deserialized definition.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    ensure_schedule_input(cfg)?;
    validate_crons(cfg)?;
    validate_task_fields(cfg)?;
    validate_groups(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(FlowdagError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn ensure_schedule_input(cfg: &RawConfigFile) -> Result<()> {
    if cfg.schedule.is_none() && cfg.dependencies.is_empty() {
        return Err(FlowdagError::MissingScheduleInput);
    }
    Ok(())
}

fn validate_crons(cfg: &RawConfigFile) -> Result<()> {
    declared_cron(cfg.pipeline.cron.as_deref())?;
    if let Some(schedule) = &cfg.schedule {
        declared_cron(schedule.cron.as_deref())?;
    }

    let mut pending: Vec<_> = cfg.dependencies.iter().collect();
    while let Some(dep) = pending.pop() {
        declared_cron(dep.cron.as_deref())?;
        pending.extend(dep.dependencies.iter());
    }
    Ok(())
}

fn validate_task_fields(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        let needs_domain = matches!(task.kind, TaskKind::PreLoad | TaskKind::Import | TaskKind::Load);
        if needs_domain && task.domain.is_none() {
            return Err(FlowdagError::ConfigError(format!(
                "task '{}' of kind {:?} requires `domain`",
                name, task.kind
            )));
        }
        if task.kind == TaskKind::Load && task.table.is_none() {
            return Err(FlowdagError::ConfigError(format!(
                "task '{}' of kind load requires `table`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_groups(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if let Some(group) = &task.group {
            if cfg.task.contains_key(group) {
                return Err(FlowdagError::ConfigError(format!(
                    "task '{}' uses group '{}' which is also a task id",
                    name, group
                )));
            }
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(FlowdagError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(FlowdagError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

/// Node an `after` edge lands on in the outermost scope: the task itself, or
/// its group when the edge crosses group boundaries.
pub(crate) fn edge_endpoints<'c>(
    tasks: &'c BTreeMap<String, TaskConfig>,
    upstream: &'c str,
    downstream: &'c str,
) -> (Option<&'c str>, &'c str, &'c str) {
    let group_of = |id: &'c str| tasks.get(id).and_then(|t| t.group.as_deref());
    match (group_of(upstream), group_of(downstream)) {
        (Some(a), Some(b)) if a == b => (Some(a), upstream, downstream),
        (up_group, down_group) => (
            None,
            up_group.unwrap_or(upstream),
            down_group.unwrap_or(downstream),
        ),
    }
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task. For
    //   [task.B]
    //   after = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }
    if let Err(cycle) = toposort(&graph, None) {
        return Err(FlowdagError::DagCycle(format!(
            "cycle detected in task DAG involving task '{}'",
            cycle.node_id()
        )));
    }

    // Edges crossing groups are declared between group nodes, which can
    // close a cycle the task graph does not have.
    let mut outer: DiGraphMap<&str, ()> = DiGraphMap::new();
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if let (None, up, down) = edge_endpoints(&cfg.task, dep, name) {
                outer.add_edge(up, down, ());
            }
        }
    }
    match toposort(&outer, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(FlowdagError::DagCycle(format!(
            "cycle detected between task groups involving '{}'",
            cycle.node_id()
        ))),
    }
}

fn stringify_options(raw: &BTreeMap<String, toml::Value>) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|(name, value)| {
            let text = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                other => {
                    return Err(FlowdagError::ConfigError(format!(
                        "[options].{} must be a scalar (got {})",
                        name,
                        other.type_str()
                    )));
                }
            };
            Ok((name.clone(), text))
        })
        .collect()
}
