use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

/// Source of "now" for the engine. All timestamps are local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a single instant, used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Number of days in the given month, `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

/// First and last date of a month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)?;
    Some((first, last))
}

/// Iterates every date of an inclusive range.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |date| *date <= end)
}

/// Distinct (year, month) pairs touched by an inclusive date range, in order.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months: Vec<(i32, u32)> = Vec::new();
    for date in dates_between(start, end) {
        let key = (date.year(), date.month());
        if months.last() != Some(&key) {
            months.push(key);
        }
    }
    months
}

/// Parses `dd.mm.yyyy` or `dd-mm-yyyy`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let normalized = input.trim().replace('-', ".");
    NaiveDate::parse_from_str(&normalized, "%d.%m.%Y")
        .map_err(|_| anyhow!("Invalid date '{}', use dd.mm.yyyy or dd-mm-yyyy", input.trim()))
}

/// Parses `hh:mm`, `hh.mm` or `hh-mm`.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let normalized = input.trim().replace(['.', '-'], ":");
    NaiveTime::parse_from_str(&normalized, "%H:%M")
        .map_err(|_| anyhow!("Invalid time '{}', use hh:mm, hh.mm or hh-mm", input.trim()))
}

/// Parses `mm.yyyy` into (year, month).
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let normalized = input.trim().replace('-', ".");
    let (month, year) = normalized
        .split_once('.')
        .ok_or_else(|| anyhow!("Invalid month '{}', use mm.yyyy", input.trim()))?;
    let month: u32 = month
        .parse()
        .map_err(|_| anyhow!("Invalid month '{}', use mm.yyyy", input.trim()))?;
    let year: i32 = year
        .parse()
        .map_err(|_| anyhow!("Invalid year in '{}', use mm.yyyy", input.trim()))?;
    if !(1..=12).contains(&month) {
        return Err(anyhow!("Month must be between 1 and 12"));
    }
    Ok((year, month))
}

/// Resolves the optional `[date] [time]` arguments of `/in` and `/out`.
///
/// Missing date defaults to today, missing time to the current time of day; no arguments
/// at all means "now". Tokens are recognised by shape, so their order does not matter.
pub fn parse_clock_arguments(args: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let mut date: Option<NaiveDate> = None;
    let mut time: Option<NaiveTime> = None;

    for token in args.split_whitespace() {
        if looks_like_date(token) && date.is_none() {
            date = Some(parse_date(token)?);
        } else if looks_like_time(token) && time.is_none() {
            time = Some(parse_time(token)?);
        } else {
            return Err(anyhow!("Unexpected argument '{}'", token));
        }
    }

    let date = date.unwrap_or_else(|| now.date());
    let time = time.unwrap_or_else(|| now.time());
    Ok(date.and_time(time))
}

fn looks_like_date(token: &str) -> bool {
    let parts: Vec<&str> = token.split(['.', '-']).collect();
    parts.len() == 3
        && parts[0].len() == 2
        && parts[1].len() == 2
        && parts[2].len() == 4
        && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit()))
}

fn looks_like_time(token: &str) -> bool {
    let parts: Vec<&str> = token.split([':', '.', '-']).collect();
    parts.len() == 2
        && (1..=2).contains(&parts[0].len())
        && parts[1].len() == 2
        && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit()))
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn format_time(time: &NaiveDateTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%d.%m.%Y %H:%M").to_string()
}

/// Renders minutes as `8h 40m`, `8h` or `40m`; negative values keep their sign.
pub fn format_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let abs = minutes.abs();
    let (hours, rest) = (abs / 60, abs % 60);
    match (hours, rest) {
        (0, m) => format!("{sign}{m}m"),
        (h, 0) => format!("{sign}{h}h"),
        (h, m) => format!("{sign}{h}h {m}m"),
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
