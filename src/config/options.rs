// src/config/options.rs

//! Pipeline context variables.
//!
//! Lookup order for a variable:
//! 1. the explicit options map
//! 2. the fallback source (process environment for [`EnvOptions`], or for
//!    [`MapOptions`] with the env fallback enabled)
//! 3. the built-in default

use std::collections::BTreeMap;

use crate::errors::{FlowdagError, Result};
use crate::schedule::ScheduleParameter;
use crate::types::{CronPeriod, PreLoadStrategy};

/// Source of context variables for a pipeline.
pub trait OptionsProvider {
    /// Value explicitly set in the options, if any.
    fn option(&self, name: &str) -> Option<String>;

    /// Value from outside the options (environment, secrets store, ...).
    fn fallback(&self, _name: &str) -> Option<String> {
        None
    }

    fn context_var(&self, name: &str) -> Option<String> {
        self.option(name)
            .filter(|v| !v.is_empty())
            .or_else(|| self.fallback(name))
    }

    /// Explicit option, else the fallback source, else `default`.
    fn setting(&self, name: &str, default: &str) -> String {
        self.context_var(name)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    /// `true` only for a (case-insensitive) `"true"` value, looked up like
    /// [`setting`](Self::setting).
    fn flag(&self, name: &str) -> bool {
        self.setting(name, "false").trim().eq_ignore_ascii_case("true")
    }
}

/// In-memory options, optionally falling back to the environment.
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    values: BTreeMap<String, String>,
    env_fallback: bool,
}

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: BTreeMap<String, String>) -> Self {
        Self {
            values,
            env_fallback: false,
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_env_fallback(mut self, enabled: bool) -> Self {
        self.env_fallback = enabled;
        self
    }
}

impl OptionsProvider for MapOptions {
    fn option(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn fallback(&self, name: &str) -> Option<String> {
        if self.env_fallback {
            std::env::var(name).ok()
        } else {
            None
        }
    }
}

/// Options read from the process environment only.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvOptions;

impl OptionsProvider for EnvOptions {
    fn option(&self, _name: &str) -> Option<String> {
        None
    }

    fn fallback(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Typed view of the context variables a pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Initial tags, from the whitespace separated `tags` variable.
    pub tags: Vec<String>,
    /// Raw `catchup` flag; only honoured when the pipeline has a cron.
    pub catchup: bool,
    pub load_dependencies: bool,
    pub cron_period: CronPeriod,
    pub schedule_parameter: ScheduleParameter,
    pub pre_load_strategy: PreLoadStrategy,
}

impl PipelineSettings {
    pub fn from_options(options: &dyn OptionsProvider) -> Result<Self> {
        let tags = options
            .setting("tags", "")
            .split_whitespace()
            .map(|t| t.to_string())
            .collect();

        let cron_period = options
            .setting("cron_period_frequency", "week")
            .parse::<CronPeriod>()
            .map_err(FlowdagError::ConfigError)?;

        let defaults = ScheduleParameter::default();
        let schedule_parameter = ScheduleParameter {
            name: options.setting("sl_schedule_parameter_name", &defaults.name),
            format: options.setting("sl_schedule_format", &defaults.format),
        };

        // Unknown strategies fall back to no pre-load check.
        let pre_load_strategy = options
            .setting("pre_load_strategy", "none")
            .parse::<PreLoadStrategy>()
            .unwrap_or_default();

        Ok(Self {
            tags,
            catchup: options.flag("catchup"),
            load_dependencies: options.flag("load_dependencies"),
            cron_period,
            schedule_parameter,
            pre_load_strategy,
        })
    }
}
