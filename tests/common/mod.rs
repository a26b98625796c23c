#![allow(dead_code)]

pub use flowdag_test_utils::{builders, init_tracing, recording};

use chrono::{DateTime, TimeZone, Utc};

/// Fixed reference time (a Wednesday, mid-afternoon) so cron comparisons and
/// schedule stamps are reproducible.
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 14, 30, 0)
        .single()
        .expect("valid reference time")
}
