use chrono::NaiveDate;

use crate::error::{EngineError, EngineResult};

/// Longest absence period accepted in one request, in days.
pub const MAX_ABSENCE_DAYS: i64 = 366;

pub fn validate_year(year: i32) -> EngineResult<()> {
    if !(2000..=2100).contains(&year) {
        return Err(EngineError::validation(format!(
            "Year {} is out of range (2000-2100)",
            year
        )));
    }
    Ok(())
}

pub fn validate_month(month: u32) -> EngineResult<()> {
    if !(1..=12).contains(&month) {
        return Err(EngineError::validation(format!(
            "Month {} is out of range (1-12)",
            month
        )));
    }
    Ok(())
}

pub fn validate_work_days(work_days: i64) -> EngineResult<()> {
    if !(0..=31).contains(&work_days) {
        return Err(EngineError::validation(format!(
            "Work days {} is out of range (0-31)",
            work_days
        )));
    }
    Ok(())
}

pub fn validate_minutes_per_day(minutes_per_day: i64) -> EngineResult<()> {
    if !(1..=1440).contains(&minutes_per_day) {
        return Err(EngineError::validation(format!(
            "Minutes per day {} is out of range (1-1440)",
            minutes_per_day
        )));
    }
    Ok(())
}

pub fn validate_schedule_fields(
    year: i32,
    month: u32,
    work_days: i64,
    minutes_per_day: i64,
) -> EngineResult<()> {
    validate_year(year)?;
    validate_month(month)?;
    validate_work_days(work_days)?;
    validate_minutes_per_day(minutes_per_day)
}

pub fn validate_first_name(name: &str) -> EngineResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(EngineError::validation("First name cannot be empty"));
    }

    if name.chars().count() > 64 {
        return Err(EngineError::validation(
            "First name cannot be longer than 64 characters",
        ));
    }

    if name.contains('\n') || name.contains('\r') {
        return Err(EngineError::validation("First name cannot contain line breaks"));
    }

    Ok(())
}

pub fn validate_telegram_chat_id(chat_id: i64) -> EngineResult<()> {
    // Telegram chat IDs should be non-zero
    if chat_id == 0 {
        return Err(EngineError::validation("Chat ID cannot be zero"));
    }

    // Supergroups start around -1000000000000; anything beyond is bogus
    if chat_id < -2_000_000_000_000 {
        return Err(EngineError::validation("Chat ID out of valid range"));
    }

    Ok(())
}

/// Ordering and length checks shared by every absence kind.
pub fn validate_absence_range(start: NaiveDate, end: NaiveDate) -> EngineResult<()> {
    if start > end {
        return Err(EngineError::validation(
            "End date cannot be earlier than start date",
        ));
    }

    let days = end.signed_duration_since(start).num_days() + 1;
    if days > MAX_ABSENCE_DAYS {
        return Err(EngineError::validation(format!(
            "Absence period cannot exceed {} days",
            MAX_ABSENCE_DAYS
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_schedule_field_bounds() {
        assert!(validate_schedule_fields(2026, 1, 29, 520).is_ok());
        assert!(validate_schedule_fields(2000, 12, 0, 1).is_ok());
        assert!(validate_schedule_fields(2100, 1, 31, 1440).is_ok());

        assert!(validate_schedule_fields(1999, 1, 20, 480).is_err());
        assert!(validate_schedule_fields(2101, 1, 20, 480).is_err());
        assert!(validate_schedule_fields(2026, 0, 20, 480).is_err());
        assert!(validate_schedule_fields(2026, 13, 20, 480).is_err());
        assert!(validate_schedule_fields(2026, 1, -1, 480).is_err());
        assert!(validate_schedule_fields(2026, 1, 32, 480).is_err());
        assert!(validate_schedule_fields(2026, 1, 20, 0).is_err());
        assert!(validate_schedule_fields(2026, 1, 20, 1441).is_err());
    }

    #[test]
    fn test_first_name() {
        assert!(validate_first_name("Anna").is_ok());
        assert!(validate_first_name("   ").is_err());
        assert!(validate_first_name("Line\nbreak").is_err());
        assert!(validate_first_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_chat_id() {
        assert!(validate_telegram_chat_id(123456789).is_ok());
        assert!(validate_telegram_chat_id(-1001234567890).is_ok());
        assert!(validate_telegram_chat_id(0).is_err());
        assert!(validate_telegram_chat_id(-3_000_000_000_000).is_err());
    }

    #[test]
    fn test_absence_range() {
        assert!(validate_absence_range(d(2026, 7, 1), d(2026, 7, 14)).is_ok());
        assert!(validate_absence_range(d(2026, 7, 1), d(2026, 7, 1)).is_ok());
        assert!(validate_absence_range(d(2026, 7, 14), d(2026, 7, 1)).is_err());
        assert!(validate_absence_range(d(2026, 1, 1), d(2027, 1, 1)).is_ok());
        assert!(validate_absence_range(d(2026, 1, 1), d(2027, 1, 2)).is_err());
    }
}
