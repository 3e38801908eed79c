//! Weekly window computation.
//!
//! Every sync targets the most recent Monday–Sunday week that has fully
//! ended, in UTC. The week in progress is never selected, so a run on a
//! Monday picks the week that closed the night before.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::Serialize;

/// A completed Monday–Sunday week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub week_key: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window for the week containing `day`.
    pub fn for_week_of(day: NaiveDate) -> Self {
        let monday = day - TimeDelta::days(i64::from(day.weekday().num_days_from_monday()));
        let start = monday.and_time(NaiveTime::MIN).and_utc();
        let end = start + TimeDelta::days(7) - TimeDelta::milliseconds(1);
        Self {
            week_key: week_key(monday),
            start,
            end,
        }
    }

    /// Parse a `YYYY-Www` key back into its window.
    pub fn from_week_key(key: &str) -> Option<Self> {
        let (year, week) = key.split_once("-W")?;
        let year: i32 = year.parse().ok()?;
        let week: u32 = week.parse().ok()?;
        if week == 0 || week > 53 {
            return None;
        }
        let monday = NaiveDate::from_isoywd_opt(year, week, chrono::Weekday::Mon)?;
        Some(Self::for_week_of(monday))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// The last fully completed week before `now`.
pub fn last_completed_week(now: DateTime<Utc>) -> TimeWindow {
    TimeWindow::for_week_of(now.date_naive() - TimeDelta::days(7))
}

/// ISO year-week of `day`, e.g. `2025-W01`.
pub fn week_key(day: NaiveDate) -> String {
    let iso = day.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

#[cfg(test)]
#[path = "window_test.rs"]
mod tests;
