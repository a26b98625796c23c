// src/schedule/mod.rs

//! Schedule resolution.
//!
//! - [`model`]: explicit schedules, domains and tables.
//! - [`dataset`]: dataset descriptors and URI sanitisation.
//! - [`cron`]: cron validation and frequency comparison.
//! - [`dependencies`]: upstream dependency sets and the schedule they imply.
//! - [`resolver`]: the pipeline-level policy combining all of the above.

pub mod cron;
pub mod dataset;
pub mod dependencies;
pub mod model;
pub mod resolver;

pub use dataset::{Dataset, ScheduleParameter, sanitize_id};
pub use dependencies::{
    ComputedSchedule, Dependencies, Dependency, DependencyKind, DependencySet, ScheduleRequest,
};
pub use model::{Domain, Schedule, Table};
pub use resolver::{ResolvedSchedule, ScheduleResolver, Trigger, least_frequent_datasets};
