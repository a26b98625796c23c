// src/types.rs

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::Deserialize;

/// Readiness check that precedes a domain load.
///
/// - `None`: no check, the load starts straight away.
/// - `Imported`: wait for imported files to be present.
/// - `Pending`: wait for pending files to be present.
/// - `Ack`: wait for an acknowledgement file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreLoadStrategy {
    None,
    Imported,
    Pending,
    Ack,
}

impl Default for PreLoadStrategy {
    fn default() -> Self {
        PreLoadStrategy::None
    }
}

impl PreLoadStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreLoadStrategy::None => "none",
            PreLoadStrategy::Imported => "imported",
            PreLoadStrategy::Pending => "pending",
            PreLoadStrategy::Ack => "ack",
        }
    }

    /// Default task id of the pre-load check for `domain`.
    pub fn task_id(&self, domain: &str) -> String {
        match self {
            PreLoadStrategy::Imported => format!("check_{domain}_incoming_files"),
            PreLoadStrategy::Pending => format!("check_{domain}_pending_files"),
            PreLoadStrategy::Ack => format!("check_{domain}_ack_file"),
            PreLoadStrategy::None => format!("pre_load_{domain}"),
        }
    }
}

impl fmt::Display for PreLoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreLoadStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(PreLoadStrategy::None),
            "imported" => Ok(PreLoadStrategy::Imported),
            "pending" => Ok(PreLoadStrategy::Pending),
            "ack" => Ok(PreLoadStrategy::Ack),
            other => Err(format!(
                "invalid pre_load_strategy: {other} (expected \"none\", \"imported\", \"pending\" or \"ack\")"
            )),
        }
    }
}

/// Reference period used when comparing how often cron expressions fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CronPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl Default for CronPeriod {
    fn default() -> Self {
        CronPeriod::Week
    }
}

impl CronPeriod {
    pub fn duration(&self) -> Duration {
        match self {
            CronPeriod::Day => Duration::days(1),
            CronPeriod::Week => Duration::days(7),
            CronPeriod::Month => Duration::days(30),
            CronPeriod::Year => Duration::days(365),
        }
    }
}

impl FromStr for CronPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(CronPeriod::Day),
            "week" => Ok(CronPeriod::Week),
            "month" => Ok(CronPeriod::Month),
            "year" => Ok(CronPeriod::Year),
            other => Err(format!(
                "invalid cron_period_frequency: {other} (expected \"day\", \"week\", \"month\" or \"year\")"
            )),
        }
    }
}
