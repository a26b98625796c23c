// src/config/model.rs

use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::Deserialize;

use crate::config::options::MapOptions;
use crate::job::JobSource;
use crate::schedule::{Dependencies, Dependency, DependencyKind, Domain, Schedule, Table};

/// Pipeline definition as read from a TOML file.
///
/// ```toml
/// [pipeline]
/// source = "sales_load.py"
/// cron = "none"
/// wrap = true
///
/// [options]
/// tags = "sales"
/// pre_load_strategy = "imported"
///
/// [[dependencies]]
/// name = "raw.orders"
/// cron = "0 * * * *"
///
/// [task.import_sales]
/// kind = "import"
/// domain = "sales"
/// tables = ["orders"]
///
/// [task.load_orders]
/// kind = "load"
/// domain = "sales"
/// table = "orders"
/// after = ["import_sales"]
/// ```
///
/// Only `[pipeline]` and at least one task are required. A validated value
/// is obtained through [`TryFrom<RawConfigFile>`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pipeline: PipelineSection,
    pub options: BTreeMap<String, String>,
    pub schedule: Option<ScheduleSection>,
    pub dependencies: Vec<DependencyConfig>,
    pub task: BTreeMap<String, TaskConfig>,
}

/// Deserialized file before semantic validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub pipeline: PipelineSection,

    /// Context variables. Scalars of any type are accepted and stringified.
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,

    #[serde(default)]
    pub schedule: Option<ScheduleSection>,

    #[serde(default)]
    pub dependencies: Vec<DependencyConfig>,

    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Name of the definition the pipeline id is derived from.
    pub source: String,

    /// Orchestrator backend to build with.
    #[serde(default = "default_orchestrator")]
    pub orchestrator: String,

    /// Cron declared next to a dependency set; `"none"` means absent.
    #[serde(default)]
    pub cron: Option<String>,

    /// Dataset URIs that must never trigger this pipeline.
    #[serde(default)]
    pub filtered_datasets: Vec<String>,

    /// Surround the tasks with `start`/`end` markers.
    #[serde(default)]
    pub wrap: bool,

    /// Datasets published by the `end` marker.
    #[serde(default)]
    pub output_datasets: Vec<String>,
}

fn default_orchestrator() -> String {
    "describe".to_string()
}

/// `[schedule]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSection {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub cron: Option<String>,

    #[serde(default)]
    pub domains: Vec<DomainConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainConfig {
    pub name: String,

    #[serde(default)]
    pub tables: Vec<String>,
}

/// One `[[dependencies]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyConfig {
    pub name: String,

    #[serde(default)]
    pub kind: DependencyKindConfig,

    #[serde(default)]
    pub sink: Option<String>,

    #[serde(default)]
    pub cron: Option<String>,

    #[serde(default)]
    pub dependencies: Vec<DependencyConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKindConfig {
    Task,
    #[default]
    Table,
}

/// What a `[task.<id>]` entry produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Dummy,
    PreLoad,
    Import,
    Load,
    Transform,
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub kind: TaskKind,

    /// Required for `pre_load`, `import` and `load`.
    #[serde(default)]
    pub domain: Option<String>,

    /// Tables of `domain` for `pre_load` and `import`.
    #[serde(default)]
    pub tables: Vec<String>,

    /// Required for `load`.
    #[serde(default)]
    pub table: Option<String>,

    /// Transform name; defaults to the task id.
    #[serde(default)]
    pub name: Option<String>,

    /// Transform options passed through verbatim.
    #[serde(default)]
    pub options: Option<String>,

    /// This task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// Top-level group the task is declared in.
    #[serde(default)]
    pub group: Option<String>,
}

impl ConfigFile {
    /// Construct without validation. Use `TryFrom<RawConfigFile>` instead.
    pub(crate) fn new_unchecked(
        pipeline: PipelineSection,
        options: BTreeMap<String, String>,
        schedule: Option<ScheduleSection>,
        dependencies: Vec<DependencyConfig>,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            pipeline,
            options,
            schedule,
            dependencies,
            task,
        }
    }

    pub fn job_source(&self) -> JobSource {
        JobSource {
            filename: self.pipeline.source.clone(),
            cron: self.pipeline.cron.clone(),
            filtered_datasets: self
                .pipeline
                .filtered_datasets
                .iter()
                .cloned()
                .collect::<IndexSet<_>>(),
        }
    }

    /// Options from the file, falling back to the environment.
    pub fn map_options(&self) -> MapOptions {
        MapOptions::from_map(self.options.clone()).with_env_fallback(true)
    }

    pub fn explicit_schedule(&self) -> Option<Schedule> {
        self.schedule.as_ref().map(|s| {
            let domains = s
                .domains
                .iter()
                .map(|d| Domain::new(&d.name, d.tables.iter().map(Table::new).collect()))
                .collect();
            Schedule::new(s.name.as_deref(), s.cron.as_deref(), domains)
        })
    }

    /// `None` when no `[[dependencies]]` are declared.
    pub fn dependency_set(&self) -> Option<Dependencies> {
        if self.dependencies.is_empty() {
            return None;
        }
        Some(self.dependencies.iter().map(DependencyConfig::to_dependency).collect())
    }

    /// Names of all groups referenced by tasks, in task order.
    pub fn groups(&self) -> IndexSet<&str> {
        self.task
            .values()
            .filter_map(|t| t.group.as_deref())
            .collect()
    }
}

impl DependencyConfig {
    pub fn to_dependency(&self) -> Dependency {
        let kind = match self.kind {
            DependencyKindConfig::Task => DependencyKind::Task,
            DependencyKindConfig::Table => DependencyKind::Table,
        };
        Dependency {
            name: self.name.clone(),
            kind,
            sink: self.sink.clone(),
            cron: self.cron.clone(),
            dependencies: self.dependencies.iter().map(Self::to_dependency).collect(),
        }
    }
}
