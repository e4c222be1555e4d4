//! Error taxonomy for the attendance engine.
//!
//! Every failure a core operation can report is an [`EngineError`]. Callers that only need
//! to decide how to react (show a hint, ask for confirmation, log and apologise) should
//! match on [`EngineError::kind`] instead of individual variants.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Coarse classification used by transports to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-fixable input problem; never retried.
    Validation,
    /// The request collides with existing state.
    Conflict,
    /// A referenced record does not exist.
    NotFound,
    /// The caller lacks the capability for the operation.
    Forbidden,
    /// The operation needs an explicit confirmation from the caller.
    ConfirmationRequired,
    /// Persistence failure; logged and surfaced as a generic failure.
    Storage,
}

/// Errors returned by the attendance engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("malformed calendar feed: {0}")]
    CalendarFeed(String),

    #[error("{0} is a non-working day")]
    NonWorkingDay(NaiveDate),

    #[error("clock-out time {clock_out} is before clock-in time {clock_in}")]
    TimeBeforeClockIn {
        clock_in: NaiveDateTime,
        clock_out: NaiveDateTime,
    },

    #[error("a schedule for {year}-{month:02} already exists")]
    DuplicateKey { year: i32, month: u32 },

    #[error("there is already an active work session")]
    AlreadyActive,

    #[error("chat {chat_id} is already registered")]
    AlreadyRegistered { chat_id: i64 },

    #[error("{0} already has a work or absence record")]
    DateOccupied(NaiveDate),

    #[error("period {start} - {end} overlaps an existing absence period")]
    AbsenceOverlap { start: NaiveDate, end: NaiveDate },

    #[error("schedule for {year}-{month:02} has recorded work and cannot be deleted")]
    ScheduleInUse { year: i32, month: u32 },

    #[error("there is no active work session")]
    NoActiveSession,

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("administrator rights are required")]
    Forbidden,

    #[error("{0} is a non-working day, clock-out needs confirmation")]
    HolidayConfirmationRequired(NaiveDate),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Result alias used by every core operation.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Classifies the error for transports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::CalendarFeed(_)
            | Self::NonWorkingDay(_)
            | Self::TimeBeforeClockIn { .. } => ErrorKind::Validation,
            Self::DuplicateKey { .. }
            | Self::AlreadyActive
            | Self::AlreadyRegistered { .. }
            | Self::DateOccupied(_)
            | Self::AbsenceOverlap { .. }
            | Self::ScheduleInUse { .. } => ErrorKind::Conflict,
            Self::NoActiveSession | Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::HolidayConfirmationRequired(_) => ErrorKind::ConfirmationRequired,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Returns true when SQLite rejected a write because of a UNIQUE constraint or index.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            // 2067 = SQLITE_CONSTRAINT_UNIQUE, 1555 = SQLITE_CONSTRAINT_PRIMARYKEY
            let by_code = db_err
                .code()
                .map(|code| code == "2067" || code == "1555")
                .unwrap_or(false);
            by_code || db_err.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

/// Message of a database error, empty for non-database errors.
pub(crate) fn database_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(EngineError::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(EngineError::NonWorkingDay(date).kind(), ErrorKind::Validation);
        assert_eq!(EngineError::AlreadyActive.kind(), ErrorKind::Conflict);
        assert_eq!(
            EngineError::DuplicateKey { year: 2026, month: 1 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(EngineError::DateOccupied(date).kind(), ErrorKind::Conflict);
        assert_eq!(
            EngineError::AlreadyRegistered { chat_id: 5 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(EngineError::NoActiveSession.kind(), ErrorKind::NotFound);
        assert_eq!(EngineError::not_found("schedule", 7).kind(), ErrorKind::NotFound);
        assert_eq!(EngineError::Forbidden.kind(), ErrorKind::Forbidden);
        assert_eq!(
            EngineError::HolidayConfirmationRequired(date).kind(),
            ErrorKind::ConfirmationRequired
        );
        assert_eq!(
            EngineError::Storage(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::DuplicateKey { year: 2026, month: 3 };
        assert_eq!(err.to_string(), "a schedule for 2026-03 already exists");

        let err = EngineError::not_found("absence period", 42);
        assert_eq!(err.to_string(), "absence period 42 not found");
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(database_message(&sqlx::Error::RowNotFound).is_empty());
    }
}
