use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite};

use super::work_session::SessionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
pub enum AbsenceKind {
    Vacation,
    SickLeave,
    DayOff,
}

impl AbsenceKind {
    pub const ALL: [AbsenceKind; 3] = [AbsenceKind::Vacation, AbsenceKind::SickLeave, AbsenceKind::DayOff];

    pub fn session_kind(&self) -> SessionKind {
        match self {
            AbsenceKind::Vacation => SessionKind::Vacation,
            AbsenceKind::SickLeave => SessionKind::SickLeave,
            AbsenceKind::DayOff => SessionKind::DayOff,
        }
    }

    pub fn label(&self) -> &'static str {
        self.session_kind().label()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AbsencePeriod {
    pub id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate, // inclusive
    pub kind: AbsenceKind,
    pub created_at: NaiveDateTime,
}

const ABSENCE_COLUMNS: &str = "id, user_id, start_date, end_date, kind, created_at";

impl AbsencePeriod {
    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        self.end_date
            .signed_duration_since(self.start_date)
            .num_days()
            + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub async fn insert<'e, E>(
        executor: E,
        user_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        kind: AbsenceKind,
        now: NaiveDateTime,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "INSERT INTO absence_periods (user_id, start_date, end_date, kind, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {ABSENCE_COLUMNS}"
        );
        sqlx::query_as::<_, AbsencePeriod>(&query)
            .bind(user_id)
            .bind(start_date)
            .bind(end_date)
            .bind(kind)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!("SELECT {ABSENCE_COLUMNS} FROM absence_periods WHERE id = ?");
        sqlx::query_as::<_, AbsencePeriod>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_by_user<'e, E>(executor: E, user_id: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {ABSENCE_COLUMNS} FROM absence_periods WHERE user_id = ? ORDER BY start_date"
        );
        sqlx::query_as::<_, AbsencePeriod>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    /// First stored period of the user that intersects `[start, end]`.
    pub async fn find_overlapping<'e, E>(
        executor: E,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {ABSENCE_COLUMNS} FROM absence_periods
             WHERE user_id = ? AND start_date <= ? AND end_date >= ?
             ORDER BY start_date
             LIMIT 1"
        );
        sqlx::query_as::<_, AbsencePeriod>(&query)
            .bind(user_id)
            .bind(end)
            .bind(start)
            .fetch_optional(executor)
            .await
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM absence_periods WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: (u32, u32), end: (u32, u32)) -> AbsencePeriod {
        AbsencePeriod {
            id: 1,
            user_id: 1,
            start_date: NaiveDate::from_ymd_opt(2026, start.0, start.1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, end.0, end.1).unwrap(),
            kind: AbsenceKind::Vacation,
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_days_are_inclusive() {
        assert_eq!(period((7, 1), (7, 14)).days(), 14);
        assert_eq!(period((3, 5), (3, 5)).days(), 1);
        assert_eq!(period((12, 30), (12, 31)).days(), 2);
    }

    #[test]
    fn test_contains() {
        let p = period((7, 1), (7, 14));
        assert!(p.contains(NaiveDate::from_ymd_opt(2026, 7, 14).unwrap()));
        assert!(!p.contains(NaiveDate::from_ymd_opt(2026, 7, 15).unwrap()));
    }

    #[test]
    fn test_session_kind_mapping() {
        assert_eq!(AbsenceKind::SickLeave.session_kind(), SessionKind::SickLeave);
        assert_eq!(AbsenceKind::DayOff.label(), "Day off");
    }
}
