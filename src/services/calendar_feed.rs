//! Parser for the yearly production-calendar feed.
//!
//! The feed lists non-working days per month as a comma separated string. A `+` suffix
//! marks a moved holiday and is still non-working; a `*` suffix marks a shortened
//! pre-holiday working day and is skipped.
//!
//! Other readers of this feed strip both suffixes and store `*` days as
//! non-working too. Skipping them instead keeps the derived work-day counts equal to the
//! feed's own `statistic` totals (247 workdays for 2026).

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarFeed {
    pub year: i32,
    pub months: Vec<FeedMonth>,
    #[serde(default)]
    pub transitions: Vec<FeedTransition>,
    #[serde(default)]
    pub statistic: Option<FeedStatistic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedMonth {
    pub month: u32,
    pub days: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedTransition {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedStatistic {
    pub workdays: i64,
    pub holidays: i64,
}

impl CalendarFeed {
    pub fn from_json(raw: &str) -> EngineResult<Self> {
        serde_json::from_str(raw).map_err(|e| EngineError::CalendarFeed(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::CalendarFeed(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Every non-working date of the feed, in feed order.
    pub fn non_working_dates(&self) -> EngineResult<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        for entry in &self.months {
            if !(1..=12).contains(&entry.month) {
                return Err(EngineError::CalendarFeed(format!(
                    "month {} is out of range",
                    entry.month
                )));
            }
            for token in entry.days.split(',') {
                let token = token.trim();
                if token.is_empty() || token.ends_with('*') {
                    continue;
                }
                let day: u32 = token.trim_end_matches('+').parse().map_err(|_| {
                    EngineError::CalendarFeed(format!(
                        "cannot parse day '{}' in month {}",
                        token, entry.month
                    ))
                })?;
                let date = NaiveDate::from_ymd_opt(self.year, entry.month, day).ok_or_else(|| {
                    EngineError::CalendarFeed(format!(
                        "{}-{:02}-{:02} does not exist",
                        self.year, entry.month, day
                    ))
                })?;
                dates.push(date);
            }
        }
        Ok(dates)
    }
}
