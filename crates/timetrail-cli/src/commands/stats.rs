//! Productivity statistics commands.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use timetrail_core::stats::{self, PeriodRange};
use timetrail_core::timefmt;

use super::common::AppContext;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Time tracked per task over a period
    Summary {
        /// Period: day, sprint or month
        #[arg(long, default_value = "day")]
        period: String,
        /// Reference date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
        /// Shift the sprint by whole weeks (e.g. -1 for the previous sprint)
        #[arg(long, default_value = "0")]
        offset: i64,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::open()?;
    let now = Utc::now();

    match action {
        StatsAction::Summary {
            period,
            date,
            offset,
        } => {
            let reference = match date {
                Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?,
                None => now.date_naive(),
            };
            let range = range_for(&period, reference, &ctx, offset)?;

            let store = ctx.store.lock().unwrap();
            let separator = store.settings().decimal_separator;
            let activities = stats::activities_in_range(store.tasks(), &range, now);
            let total: i64 = activities.iter().map(|a| a.duration_ms).sum();

            println!(
                "{period} {} .. {}",
                range.start.date_naive(),
                range.end.date_naive()
            );
            for activity in &activities {
                println!(
                    "{}  {:>6}h  {}",
                    timefmt::format_hms(activity.duration_ms),
                    timefmt::format_work_units(activity.duration_ms, separator),
                    activity.name,
                );
            }
            println!(
                "total: {} ({}h)",
                timefmt::format_hms(total),
                timefmt::format_work_units(total, separator),
            );
        }
    }

    Ok(())
}

fn range_for(
    period: &str,
    reference: NaiveDate,
    ctx: &AppContext,
    offset: i64,
) -> Result<PeriodRange, Box<dyn std::error::Error>> {
    match period {
        "day" => Ok(stats::day_range(reference)),
        "month" => Ok(stats::month_range(reference)),
        "sprint" => Ok(stats::sprint_range(reference, &ctx.config, offset)),
        other => Err(format!("unknown period: {other}").into()),
    }
}
