//! Elapsed-time math and display formatting.

use chrono::{DateTime, Utc};

use crate::settings::DecimalSeparator;
use crate::task::TimeInterval;

/// Total elapsed milliseconds across intervals; an open interval is counted
/// up to `now`.
pub fn total_ms(intervals: &[TimeInterval], now: DateTime<Utc>) -> i64 {
    intervals.iter().map(|i| i.elapsed_ms(now)).sum()
}

/// `HH:MM:SS`, clamped at zero.
pub fn format_hms(ms: i64) -> String {
    let total_sec = ms.max(0) / 1000;
    let h = total_sec / 3600;
    let m = (total_sec % 3600) / 60;
    let s = total_sec % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Work units: fractional hours.
pub fn work_units(ms: i64) -> f64 {
    ms.max(0) as f64 / 3_600_000.0
}

/// Work units with two decimals, honoring the configured separator.
/// `System` renders with a dot; there is no locale service at this layer.
pub fn format_work_units(ms: i64, separator: DecimalSeparator) -> String {
    let formatted = format!("{:.2}", work_units(ms));
    match separator {
        DecimalSeparator::Comma => formatted.replace('.', ","),
        DecimalSeparator::System | DecimalSeparator::Dot => formatted,
    }
}
