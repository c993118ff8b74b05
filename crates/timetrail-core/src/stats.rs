//! Dashboard aggregation: pure derived-data functions over the task list.
//!
//! Durations are clipped to the requested range, so an interval straddling a
//! boundary only contributes its overlapping part.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::storage::AppConfig;
use crate::task::Task;

/// Half-open aggregation window: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One calendar day.
pub fn day_range(date: NaiveDate) -> PeriodRange {
    let start = midnight(date);
    PeriodRange {
        start,
        end: start + Duration::days(1),
    }
}

/// The calendar month containing `date`.
pub fn month_range(date: NaiveDate) -> PeriodRange {
    let first = date.with_day(1).unwrap_or(date);
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .unwrap_or(first);
    PeriodRange {
        start: midnight(first),
        end: midnight(next_month),
    }
}

/// The sprint containing `today`, shifted by `offset_weeks`.
///
/// A sprint runs from the most recent `start_day` (weekday, 0 = Sunday)
/// through `end_day` inclusive.
pub fn sprint_range(today: NaiveDate, config: &AppConfig, offset_weeks: i64) -> PeriodRange {
    let start_day = i64::from(config.sprint.start_day % 7);
    let end_day = i64::from(config.sprint.end_day % 7);

    let weekday = i64::from(today.weekday().num_days_from_sunday());
    let back = (weekday - start_day).rem_euclid(7);
    let sprint_start = today - Duration::days(back) + Duration::weeks(offset_weeks);

    let duration_days = (end_day - start_day).rem_euclid(7);
    PeriodRange {
        start: midnight(sprint_start),
        end: midnight(sprint_start + Duration::days(duration_days + 1)),
    }
}

/// Per-task time spent inside a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActivity {
    pub task_id: String,
    pub name: String,
    pub duration_ms: i64,
}

/// Tasks with activity inside the range, longest first. Open intervals are
/// counted up to `now`.
pub fn activities_in_range(
    tasks: &[Task],
    range: &PeriodRange,
    now: DateTime<Utc>,
) -> Vec<TaskActivity> {
    let mut activities: Vec<TaskActivity> = tasks
        .iter()
        .filter_map(|task| {
            let duration_ms = task
                .intervals
                .iter()
                .map(|interval| {
                    let start = interval.start.max(range.start);
                    let end = interval.end.unwrap_or(now).min(range.end);
                    (end - start).num_milliseconds().max(0)
                })
                .sum::<i64>();
            (duration_ms > 0).then(|| TaskActivity {
                task_id: task.id.clone(),
                name: task.name.clone(),
                duration_ms,
            })
        })
        .collect();
    activities.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));
    activities
}

/// Total tracked milliseconds inside the range.
pub fn total_ms_in_range(tasks: &[Task], range: &PeriodRange, now: DateTime<Utc>) -> i64 {
    activities_in_range(tasks, range, now)
        .iter()
        .map(|a| a.duration_ms)
        .sum()
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TimeInterval};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task_with_interval(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Task {
        let mut task = Task::new(id, None, vec![], start);
        task.id = id.to_string();
        task.intervals.push(TimeInterval {
            id: format!("{id}-i"),
            start,
            end: Some(end),
        });
        task
    }

    #[test]
    fn test_day_range_is_one_day() {
        let range = day_range(date(2025, 6, 1));
        assert_eq!(range.end - range.start, Duration::days(1));
    }

    #[test]
    fn test_month_range_covers_whole_month() {
        let range = month_range(date(2025, 6, 15));
        assert_eq!(range.start, midnight(date(2025, 6, 1)));
        assert_eq!(range.end, midnight(date(2025, 7, 1)));

        let december = month_range(date(2025, 12, 3));
        assert_eq!(december.end, midnight(date(2026, 1, 1)));
    }

    #[test]
    fn test_sprint_range_monday_to_friday() {
        // 2025-06-04 is a Wednesday; Monday-Friday sprint starts 06-02.
        let config = AppConfig::default();
        let range = sprint_range(date(2025, 6, 4), &config, 0);
        assert_eq!(range.start, midnight(date(2025, 6, 2)));
        assert_eq!(range.end, midnight(date(2025, 6, 7)));
    }

    #[test]
    fn test_sprint_offset_shifts_by_weeks() {
        let config = AppConfig::default();
        let current = sprint_range(date(2025, 6, 4), &config, 0);
        let previous = sprint_range(date(2025, 6, 4), &config, -1);
        assert_eq!(current.start - previous.start, Duration::weeks(1));
    }

    #[test]
    fn test_activity_clipped_to_range() {
        let range = day_range(date(2025, 6, 1));
        // Two hours straddling midnight into 06-01: only one hour counts.
        let task = task_with_interval(
            "t",
            range.start - Duration::hours(1),
            range.start + Duration::hours(1),
        );

        let activities = activities_in_range(&[task], &range, range.end);
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].duration_ms, 3_600_000);
    }

    #[test]
    fn test_task_without_activity_in_range_excluded() {
        let range = day_range(date(2025, 6, 1));
        let task = task_with_interval(
            "t",
            range.end + Duration::hours(1),
            range.end + Duration::hours(2),
        );
        assert!(activities_in_range(&[task], &range, range.end).is_empty());
    }

    #[test]
    fn test_activities_sorted_longest_first() {
        let range = day_range(date(2025, 6, 1));
        let short = task_with_interval(
            "short",
            range.start,
            range.start + Duration::minutes(10),
        );
        let long = task_with_interval(
            "long",
            range.start,
            range.start + Duration::hours(2),
        );

        let activities = activities_in_range(&[short, long], &range, range.end);
        assert_eq!(activities[0].task_id, "long");
        assert_eq!(
            total_ms_in_range(
                &[task_with_interval(
                    "t",
                    range.start,
                    range.start + Duration::hours(1)
                )],
                &range,
                range.end
            ),
            3_600_000
        );
    }
}
