// src/schedule/resolver.rs

//! Effective trigger policy of a pipeline.
//!
//! Three outcomes are possible:
//! - a cron string (declared explicitly, or declared next to a dependency set)
//! - a list of triggering datasets derived from the dependency set
//! - nothing at all (manual / unscheduled pipeline)

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use crate::config::options::PipelineSettings;
use crate::errors::{FlowdagError, Result};
use crate::job::JobSource;
use crate::schedule::cron::{declared_cron, sort_crons_by_frequency};
use crate::schedule::dataset::{Dataset, ScheduleParameter};
use crate::schedule::dependencies::{ComputedSchedule, DependencySet, ScheduleRequest};
use crate::schedule::model::Schedule;
use crate::types::CronPeriod;

/// Final trigger value handed to the scheduler adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger<'a> {
    Cron(&'a str),
    Datasets(&'a [Dataset]),
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchedule {
    /// Name of the explicit schedule, if any.
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub cron: Option<String>,
    pub catchup: bool,
    /// `None` when resolved from an explicit schedule.
    pub load_dependencies: Option<bool>,
    pub triggering_datasets: Option<Vec<Dataset>>,
    /// Slower-cadence triggering datasets to re-emit as output events.
    pub least_frequent_datasets: Vec<Dataset>,
}

impl ResolvedSchedule {
    pub fn trigger(&self) -> Trigger<'_> {
        match (&self.cron, &self.triggering_datasets) {
            (Some(cron), _) => Trigger::Cron(cron),
            (None, Some(datasets)) if !datasets.is_empty() => Trigger::Datasets(datasets),
            _ => Trigger::Manual,
        }
    }
}

pub struct ScheduleResolver<'a> {
    settings: &'a PipelineSettings,
    at: DateTime<Utc>,
}

impl<'a> ScheduleResolver<'a> {
    /// `at` is the reference time for cron frequency comparison and dataset
    /// schedule stamps.
    pub fn new(settings: &'a PipelineSettings, at: DateTime<Utc>) -> Self {
        Self { settings, at }
    }

    /// Resolve from an explicit schedule, or else from a dependency set.
    ///
    /// Fails with [`FlowdagError::MissingScheduleInput`] when neither is given.
    pub fn resolve(
        &self,
        schedule: Option<&Schedule>,
        dependencies: Option<&dyn DependencySet>,
        source: &JobSource,
    ) -> Result<ResolvedSchedule> {
        let resolved = match (schedule, dependencies) {
            (Some(schedule), _) => self.resolve_explicit(schedule)?,
            (None, Some(dependencies)) => self.resolve_dependencies(dependencies, source)?,
            (None, None) => return Err(FlowdagError::MissingScheduleInput),
        };

        info!(
            cron = ?resolved.cron,
            catchup = resolved.catchup,
            datasets = resolved.triggering_datasets.as_ref().map(|d| d.len()),
            republished = resolved.least_frequent_datasets.len(),
            "resolved pipeline schedule"
        );
        Ok(resolved)
    }

    fn resolve_explicit(&self, schedule: &Schedule) -> Result<ResolvedSchedule> {
        let cron = declared_cron(schedule.cron.as_deref())?;
        let mut tags = self.settings.tags.clone();
        tags.extend(schedule.domains.iter().map(|d| d.name.clone()));

        Ok(ResolvedSchedule {
            name: schedule.name().map(|n| n.to_string()),
            tags,
            cron,
            catchup: false,
            load_dependencies: None,
            triggering_datasets: None,
            least_frequent_datasets: Vec::new(),
        })
    }

    fn resolve_dependencies(
        &self,
        dependencies: &dyn DependencySet,
        source: &JobSource,
    ) -> Result<ResolvedSchedule> {
        let mut cron = declared_cron(source.cron.as_deref())?;
        let catchup = cron.is_some() && self.settings.catchup;
        let load_dependencies = self.settings.load_dependencies;

        let request = ScheduleRequest {
            cron: cron.as_deref(),
            load_dependencies,
            filtered_datasets: &source.filtered_datasets,
            schedule_parameter: &self.settings.schedule_parameter,
            at: self.at,
        };

        let mut triggering_datasets = None;
        match dependencies.schedule(&request)? {
            Some(ComputedSchedule::Cron(computed)) => cron = Some(computed),
            Some(ComputedSchedule::Datasets(datasets)) if !datasets.is_empty() => {
                triggering_datasets = Some(datasets)
            }
            _ => {}
        }

        let least_frequent_datasets = match &triggering_datasets {
            Some(datasets) => least_frequent_datasets(
                datasets,
                self.settings.cron_period,
                &self.settings.schedule_parameter,
                self.at,
            )?,
            None => Vec::new(),
        };

        Ok(ResolvedSchedule {
            name: None,
            tags: self.settings.tags.clone(),
            cron,
            catchup,
            load_dependencies: Some(load_dependencies),
            triggering_datasets,
            least_frequent_datasets,
        })
    }
}

/// `uri -> cron` for every dataset carrying a cron. A URI seen twice keeps
/// its last cron.
pub fn scheduled_datasets(datasets: &[Dataset]) -> IndexMap<String, String> {
    datasets
        .iter()
        .filter_map(|d| d.cron().map(|cron| (d.uri().to_string(), cron.to_string())))
        .collect()
}

/// Datasets whose cron is not the most frequent one among `datasets`.
///
/// With fewer than two distinct crons nothing needs republishing and the
/// result is empty. Returned datasets are fresh descriptors carrying the
/// original URI and cron, stamped with `parameter` as of `at`.
pub fn least_frequent_datasets(
    datasets: &[Dataset],
    period: CronPeriod,
    parameter: &ScheduleParameter,
    at: DateTime<Utc>,
) -> Result<Vec<Dataset>> {
    let scheduled = scheduled_datasets(datasets);
    let distinct: IndexSet<&str> = scheduled.values().map(|c| c.as_str()).collect();
    if distinct.len() < 2 {
        return Ok(Vec::new());
    }

    let sorted = sort_crons_by_frequency(distinct.iter().copied(), period, at)?;
    let least_frequent: IndexSet<&str> = sorted
        .iter()
        .skip(1)
        .map(|(expr, _)| expr.as_str())
        .collect();

    let republished = scheduled
        .iter()
        .filter(|(_, cron)| least_frequent.contains(cron.as_str()))
        .map(|(uri, cron)| Dataset::new(uri, Some(cron))?.stamped(parameter, at))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        most_frequent = %sorted[0].0,
        republished = ?republished.iter().map(|d| d.uri()).collect::<Vec<_>>(),
        "least frequent datasets"
    );
    Ok(republished)
}
