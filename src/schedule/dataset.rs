// src/schedule/dataset.rs

//! Named synchronisation points between producing and consuming pipelines.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;

use crate::errors::Result;
use crate::schedule::cron::{declared_cron, schedule_stamp};

static UNSAFE_ID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("static regex is valid"));

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_id(id: &str) -> String {
    UNSAFE_ID_CHARS.replace_all(id.trim(), "_").into_owned()
}

/// Name and layout of the query parameter carrying a dataset's schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleParameter {
    pub name: String,
    pub format: String,
}

impl Default for ScheduleParameter {
    fn default() -> Self {
        Self {
            name: "sl_schedule".to_string(),
            format: "%Y%m%dT%H%M".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    uri: String,
    cron: Option<String>,
    parameters: IndexMap<String, String>,
}

impl Dataset {
    /// Build a dataset; the URI is sanitised and lower-cased.
    ///
    /// A cron of `"none"` is dropped, an invalid one is rejected with
    /// [`FlowdagError::InvalidCron`](crate::errors::FlowdagError::InvalidCron).
    pub fn new(uri: &str, cron: Option<&str>) -> Result<Self> {
        Ok(Self {
            uri: sanitize_id(uri).to_lowercase(),
            cron: declared_cron(cron)?,
            parameters: IndexMap::new(),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn cron(&self) -> Option<&str> {
        self.cron.as_deref()
    }

    pub fn parameters(&self) -> &IndexMap<String, String> {
        &self.parameters
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Stamp the schedule parameter from the dataset's cron as seen at `at`.
    /// Datasets without a cron are returned unchanged.
    pub fn stamped(self, parameter: &ScheduleParameter, at: DateTime<Utc>) -> Result<Self> {
        match self.cron.clone() {
            Some(cron) => {
                let value = schedule_stamp(&cron, &parameter.format, at)?;
                Ok(self.with_parameter(parameter.name.clone(), value))
            }
            None => Ok(self),
        }
    }

    /// `?k=v&k2=v2`, or an empty string without parameters.
    pub fn query_parameters(&self) -> String {
        if self.parameters.is_empty() {
            return String::new();
        }
        let pairs = self
            .parameters
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>();
        format!("?{}", pairs.join("&"))
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.uri, self.query_parameters())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cron {
            Some(cron) => write!(f, "{} ({cron})", self.uri),
            None => f.write_str(&self.uri),
        }
    }
}
