use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Clocked in, not yet out.
    Active,
    /// Clocked out; figures are final.
    Completed,
    /// Synthesized from an absence period.
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
pub enum SessionKind {
    Work,
    Vacation,
    SickLeave,
    DayOff,
}

impl SessionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SessionKind::Work => "Work",
            SessionKind::Vacation => "Vacation",
            SessionKind::SickLeave => "Sick leave",
            SessionKind::DayOff => "Day off",
        }
    }
}

/// One user's record for one date.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WorkSession {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub clock_in_time: NaiveDateTime,
    pub clock_out_time: Option<NaiveDateTime>,
    pub required_minutes: i64,
    pub worked_minutes: i64,
    pub diff_minutes: i64,
    pub status: SessionStatus,
    pub session_kind: SessionKind,
    pub absence_period_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields of a synthesized absence session.
#[derive(Debug, Clone)]
pub struct AbsenceSessionDraft {
    pub user_id: i64,
    pub date: NaiveDate,
    pub clock_in_time: NaiveDateTime,
    pub clock_out_time: NaiveDateTime,
    pub required_minutes: i64,
    pub session_kind: SessionKind,
    pub absence_period_id: i64,
}

const SESSION_COLUMNS: &str = "id, user_id, date, clock_in_time, clock_out_time, required_minutes, \
     worked_minutes, diff_minutes, status, session_kind, absence_period_id, created_at, updated_at";

/// Whole minutes between clock-in and clock-out, rounded down.
pub fn worked_minutes_between(clock_in: NaiveDateTime, clock_out: NaiveDateTime) -> i64 {
    clock_out.signed_duration_since(clock_in).num_minutes().max(0)
}

impl WorkSession {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active && self.clock_out_time.is_none()
    }

    pub fn is_absence(&self) -> bool {
        self.session_kind != SessionKind::Work
    }

    pub async fn insert_active<'e, E>(
        executor: E,
        user_id: i64,
        clock_in_time: NaiveDateTime,
        required_minutes: i64,
        now: NaiveDateTime,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "INSERT INTO work_sessions (user_id, date, clock_in_time, clock_out_time, required_minutes,
                 worked_minutes, diff_minutes, status, session_kind, absence_period_id, created_at, updated_at)
             VALUES (?, ?, ?, NULL, ?, 0, ?, ?, ?, NULL, ?, ?)
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .bind(clock_in_time.date())
            .bind(clock_in_time)
            .bind(required_minutes)
            .bind(-required_minutes)
            .bind(SessionStatus::Active)
            .bind(SessionKind::Work)
            .bind(now)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Credits the full required minutes for one absence date.
    pub async fn insert_absence<'e, E>(
        executor: E,
        draft: &AbsenceSessionDraft,
        now: NaiveDateTime,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "INSERT INTO work_sessions (user_id, date, clock_in_time, clock_out_time, required_minutes,
                 worked_minutes, diff_minutes, status, session_kind, absence_period_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(draft.user_id)
            .bind(draft.date)
            .bind(draft.clock_in_time)
            .bind(draft.clock_out_time)
            .bind(draft.required_minutes)
            .bind(draft.required_minutes)
            .bind(SessionStatus::Absent)
            .bind(draft.session_kind)
            .bind(draft.absence_period_id)
            .bind(now)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Closes an active session. Returns `None` if it was not active any more.
    pub async fn complete<'e, E>(
        executor: E,
        id: i64,
        clock_out_time: NaiveDateTime,
        worked_minutes: i64,
        diff_minutes: i64,
        now: NaiveDateTime,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "UPDATE work_sessions
             SET clock_out_time = ?, worked_minutes = ?, diff_minutes = ?, status = ?, updated_at = ?
             WHERE id = ? AND status = ?
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(clock_out_time)
            .bind(worked_minutes)
            .bind(diff_minutes)
            .bind(SessionStatus::Completed)
            .bind(now)
            .bind(id)
            .bind(SessionStatus::Active)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_active_by_user<'e, E>(
        executor: E,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE user_id = ? AND status = ? LIMIT 1"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .bind(SessionStatus::Active)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_user_and_date<'e, E>(
        executor: E,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query =
            format!("SELECT {SESSION_COLUMNS} FROM work_sessions WHERE user_id = ? AND date = ?");
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .bind(date)
            .fetch_optional(executor)
            .await
    }

    /// Earliest date in the inclusive range that already has a session.
    pub async fn first_occupied_date<'e, E>(
        executor: E,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<NaiveDate>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, NaiveDate>(
            "SELECT date FROM work_sessions WHERE user_id = ? AND date BETWEEN ? AND ? ORDER BY date LIMIT 1",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_optional(executor)
        .await
    }

    pub async fn list_by_user<'e, E>(
        executor: E,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE user_id = ? ORDER BY date DESC LIMIT ?"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(executor)
            .await
    }

    pub async fn list_by_user_between<'e, E>(
        executor: E,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions
             WHERE user_id = ? AND date BETWEEN ? AND ?
             ORDER BY date"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await
    }

    pub async fn list_by_absence_period<'e, E>(
        executor: E,
        absence_period_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE absence_period_id = ? ORDER BY date"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(absence_period_id)
            .fetch_all(executor)
            .await
    }

    pub async fn delete_by_absence_period<'e, E>(
        executor: E,
        absence_period_id: i64,
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM work_sessions WHERE absence_period_id = ?")
            .bind(absence_period_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Distinct dates and summed minutes of finished sessions (completed or absent)
    /// in the inclusive range.
    pub async fn worked_totals<'e, E>(
        executor: E,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(i64, i64), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(DISTINCT date), COALESCE(SUM(worked_minutes), 0)
             FROM work_sessions
             WHERE user_id = ? AND date BETWEEN ? AND ? AND status IN (?, ?)",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(SessionStatus::Completed)
        .bind(SessionStatus::Absent)
        .fetch_one(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_worked_minutes_rounds_down() {
        assert_eq!(worked_minutes_between(at(9, 0), at(17, 30)), 510);
        let with_seconds = NaiveDate::from_ymd_opt(2026, 2, 2)
            .unwrap()
            .and_hms_opt(17, 30, 59)
            .unwrap();
        assert_eq!(worked_minutes_between(at(9, 0), with_seconds), 510);
    }

    #[test]
    fn test_worked_minutes_across_midnight() {
        let clock_out = NaiveDate::from_ymd_opt(2026, 2, 3)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        assert_eq!(worked_minutes_between(at(22, 0), clock_out), 180);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(SessionKind::SickLeave.label(), "Sick leave");
        assert_eq!(SessionKind::Work.label(), "Work");
    }
}
