// src/schedule/cron.rs

//! Cron helpers: validation, frequency comparison and interval bounds.
//!
//! Expressions are accepted in the usual 5-field crontab form
//! (`min hour day-of-month month day-of-week`). The `cron` crate wants a
//! leading seconds field and numbers weekdays 1-7 from Sunday, where crontab
//! uses 0-6 (and 7) from Sunday, so 5-field expressions get a seconds field
//! and their numeric weekdays shifted by one. 6/7-field expressions and
//! `@daily`-style aliases are taken in the `cron` crate's own notation.

use std::fmt::Write;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use tracing::debug;

use crate::errors::{FlowdagError, Result};
use crate::types::CronPeriod;

/// Timestamp layout of the `sl_start_date` / `sl_end_date` transform options.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// Occurrence counts saturate here so that second-level crons over a long
/// period stay cheap to compare.
const MAX_COUNTED: usize = 1_000_000;

/// Rewrite a 5-field crontab expression into the `cron` crate's notation.
pub fn normalize_cron(expr: &str) -> String {
    let trimmed = expr.trim();
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    match fields.as_slice() {
        [minute, hour, day, month, weekday] => {
            format!("0 {minute} {hour} {day} {month} {}", crontab_weekdays(weekday))
        }
        _ => trimmed.to_string(),
    }
}

/// Shift numeric crontab weekdays (`0`-`7`, Sunday = 0 or 7) to the
/// `cron` crate's `1`-`7` (Sunday = 1). Names, `*` and `?` are kept.
fn crontab_weekdays(field: &str) -> String {
    field
        .split(',')
        .map(crontab_weekday_item)
        .collect::<Vec<_>>()
        .join(",")
}

fn crontab_weekday_item(item: &str) -> String {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (item, None),
    };
    let with_step = |base: String| match step {
        Some(step) => format!("{base}/{step}"),
        None => base,
    };

    if let Some((start, end)) = base.split_once('-') {
        let (Ok(start), Ok(end)) = (start.parse::<u32>(), end.parse::<u32>()) else {
            return item.to_string();
        };
        if end < 7 {
            return with_step(format!("{}-{}", start + 1, end + 1));
        }
        // Range reaching Sunday = 7: Saturday is the crate's last day, the
        // trailing Sunday is listed on its own.
        let shifted = with_step(format!("{}-7", start + 1));
        let reaches_sunday = match step.map(str::parse::<u32>) {
            None => true,
            Some(Ok(step)) if step > 0 => (7 - start) % step == 0,
            _ => false,
        };
        return if start > 0 && reaches_sunday {
            format!("{shifted},1")
        } else {
            shifted
        };
    }

    match base.parse::<u32>() {
        Ok(7) => with_step("1".to_string()),
        Ok(day) => with_step((day + 1).to_string()),
        Err(_) => item.to_string(),
    }
}

pub fn parse_cron(expr: &str) -> Result<Schedule> {
    Schedule::from_str(&normalize_cron(expr))
        .map_err(|e| FlowdagError::InvalidCron(format!("{expr} ({e})")))
}

pub fn is_valid_cron(expr: &str) -> bool {
    !expr.trim().is_empty() && parse_cron(expr).is_ok()
}

/// `true` for the literal `none`, whatever the case and surrounding blanks.
pub fn is_none_literal(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("none")
}

/// Normalise a caller-declared cron.
///
/// - absent, blank or `"none"` -> `Ok(None)`
/// - valid expression -> `Ok(Some(expr))` (trimmed)
/// - anything else -> [`FlowdagError::InvalidCron`]
pub fn declared_cron(raw: Option<&str>) -> Result<Option<String>> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() || is_none_literal(value) => Ok(None),
        Some(value) => {
            parse_cron(value)?;
            Ok(Some(value.trim().to_string()))
        }
    }
}

/// Number of ticks of `schedule` in `(from, until]`.
pub fn count_occurrences(schedule: &Schedule, from: DateTime<Utc>, until: DateTime<Utc>) -> usize {
    schedule
        .after(&from)
        .take_while(|tick| *tick <= until)
        .take(MAX_COUNTED)
        .count()
}

/// Sort distinct cron expressions by how often they fire during `period`
/// starting at `from`, most frequent first.
///
/// Ties keep a stable order by expression text. Each entry carries its
/// occurrence count.
pub fn sort_crons_by_frequency<'a, I>(
    crons: I,
    period: CronPeriod,
    from: DateTime<Utc>,
) -> Result<Vec<(String, usize)>>
where
    I: IntoIterator<Item = &'a str>,
{
    let until = from + period.duration();

    let mut scored = crons
        .into_iter()
        .map(|expr| {
            let schedule = parse_cron(expr)?;
            Ok((expr.to_string(), count_occurrences(&schedule, from, until)))
        })
        .collect::<Result<Vec<_>>>()?;

    scored.sort_by(|(a_expr, a_count), (b_expr, b_count)| {
        b_count.cmp(a_count).then_with(|| a_expr.cmp(b_expr))
    });

    debug!(?scored, ?period, "sorted crons by frequency");
    Ok(scored)
}

/// Latest tick at or before `at`.
pub fn last_tick(schedule: &Schedule, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match schedule.after(&(at - Duration::seconds(1))).next() {
        Some(tick) if tick == at => Some(tick),
        _ => schedule.after(&at).next_back(),
    }
}

/// Bounds of the last complete interval of `cron` as seen from `at`,
/// formatted as transform options:
/// `sl_start_date='…',sl_end_date='…'`.
pub fn cron_start_end_dates(cron: &str, at: DateTime<Utc>) -> Result<String> {
    let schedule = parse_cron(cron)?;
    let no_tick = || FlowdagError::InvalidCron(format!("{cron} (no occurrence before {at})"));

    let end = last_tick(&schedule, at).ok_or_else(no_tick)?;
    let start = schedule.after(&end).next_back().ok_or_else(no_tick)?;

    Ok(format!(
        "sl_start_date='{}',sl_end_date='{}'",
        start.format(TIMESTAMP_FORMAT),
        end.format(TIMESTAMP_FORMAT)
    ))
}

/// Value stamped onto a dataset URL for the schedule parameter: the last tick
/// of `cron` at `at`, rendered with `format`.
pub fn schedule_stamp(cron: &str, format: &str, at: DateTime<Utc>) -> Result<String> {
    let schedule = parse_cron(cron)?;
    let tick = last_tick(&schedule, at)
        .ok_or_else(|| FlowdagError::InvalidCron(format!("{cron} (no occurrence before {at})")))?;

    let mut stamp = String::new();
    write!(stamp, "{}", tick.format(format))
        .map_err(|_| FlowdagError::ConfigError(format!("invalid schedule format: {format}")))?;
    Ok(stamp)
}
