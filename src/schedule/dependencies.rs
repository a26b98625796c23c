// src/schedule/dependencies.rs

//! Upstream dependency sets and the schedule they imply.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use tracing::debug;

use crate::errors::Result;
use crate::schedule::dataset::{Dataset, ScheduleParameter, sanitize_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Task,
    Table,
}

/// One upstream a pipeline depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub kind: DependencyKind,
    /// Dataset produced by the upstream, when it differs from `name`.
    pub sink: Option<String>,
    pub cron: Option<String>,
    /// Transitive upstreams; not used to compute the trigger.
    pub dependencies: Vec<Dependency>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, kind: DependencyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sink: None,
            cron: None,
            dependencies: Vec::new(),
        }
    }

    pub fn table(name: impl Into<String>) -> Self {
        Self::new(name, DependencyKind::Table)
    }

    pub fn task(name: impl Into<String>) -> Self {
        Self::new(name, DependencyKind::Task)
    }

    pub fn with_cron(mut self, cron: impl Into<String>) -> Self {
        self.cron = Some(cron.into());
        self
    }

    pub fn with_sink(mut self, sink: impl Into<String>) -> Self {
        self.sink = Some(sink.into());
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Dataset identifier published by this upstream.
    pub fn uri(&self) -> &str {
        self.sink.as_deref().unwrap_or(&self.name)
    }
}

/// Inputs of a schedule computation.
#[derive(Debug, Clone)]
pub struct ScheduleRequest<'a> {
    /// Caller-declared cron, already validated.
    pub cron: Option<&'a str>,
    pub load_dependencies: bool,
    /// Dataset URIs that must never trigger the pipeline.
    pub filtered_datasets: &'a IndexSet<String>,
    pub schedule_parameter: &'a ScheduleParameter,
    /// Reference time used to stamp dataset schedule parameters.
    pub at: DateTime<Utc>,
}

/// What a dependency set resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputedSchedule {
    Cron(String),
    Datasets(Vec<Dataset>),
}

/// Anything able to turn upstream dependencies into a trigger.
pub trait DependencySet {
    /// `Ok(None)` means the pipeline is not scheduled at all.
    fn schedule(&self, request: &ScheduleRequest<'_>) -> Result<Option<ComputedSchedule>>;
}

/// Ordered list of direct upstream dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    items: Vec<Dependency>,
}

impl Dependencies {
    pub fn new(items: Vec<Dependency>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Datasets of the direct dependencies, deduplicated by URI in
    /// declaration order, without the filtered ones.
    pub fn datasets(&self, request: &ScheduleRequest<'_>) -> Result<Vec<Dataset>> {
        let filtered: IndexSet<String> = request
            .filtered_datasets
            .iter()
            .map(|uri| sanitize_id(uri).to_lowercase())
            .collect();

        let mut seen: IndexSet<String> = IndexSet::new();
        let mut datasets = Vec::new();

        for dependency in self.items.iter() {
            let dataset = Dataset::new(dependency.uri(), dependency.cron.as_deref())?;
            if filtered.contains(dataset.uri()) {
                debug!(uri = %dataset.uri(), "skipping filtered dataset");
                continue;
            }
            if !seen.insert(dataset.uri().to_string()) {
                continue;
            }
            datasets.push(dataset.stamped(request.schedule_parameter, request.at)?);
        }

        Ok(datasets)
    }
}

impl DependencySet for Dependencies {
    fn schedule(&self, request: &ScheduleRequest<'_>) -> Result<Option<ComputedSchedule>> {
        if let Some(cron) = request.cron {
            return Ok(Some(ComputedSchedule::Cron(cron.to_string())));
        }
        if request.load_dependencies {
            return Ok(None);
        }

        let datasets = self.datasets(request)?;
        if datasets.is_empty() {
            Ok(None)
        } else {
            Ok(Some(ComputedSchedule::Datasets(datasets)))
        }
    }
}

impl FromIterator<Dependency> for Dependencies {
    fn from_iter<T: IntoIterator<Item = Dependency>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
