use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite};

/// Planned work for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub year: i32,
    pub month: u32,
    pub work_days: i64,
    pub minutes_per_day: i64,
    pub total_minutes: i64, // work_days * minutes_per_day, rewritten on every write
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

const SCHEDULE_COLUMNS: &str =
    "id, year, month, work_days, minutes_per_day, total_minutes, created_at, updated_at";

impl Schedule {
    pub fn total_for(work_days: i64, minutes_per_day: i64) -> i64 {
        work_days * minutes_per_day
    }

    pub async fn insert<'e, E>(
        executor: E,
        year: i32,
        month: u32,
        work_days: i64,
        minutes_per_day: i64,
        now: NaiveDateTime,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "INSERT INTO work_schedules (year, month, work_days, minutes_per_day, total_minutes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {SCHEDULE_COLUMNS}"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(year)
            .bind(month)
            .bind(work_days)
            .bind(minutes_per_day)
            .bind(Self::total_for(work_days, minutes_per_day))
            .bind(now)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Rewrites the mutable body; `None` when the id does not exist.
    pub async fn update_body<'e, E>(
        executor: E,
        id: i64,
        work_days: i64,
        minutes_per_day: i64,
        now: NaiveDateTime,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "UPDATE work_schedules
             SET work_days = ?, minutes_per_day = ?, total_minutes = ?, updated_at = ?
             WHERE id = ?
             RETURNING {SCHEDULE_COLUMNS}"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(work_days)
            .bind(minutes_per_day)
            .bind(Self::total_for(work_days, minutes_per_day))
            .bind(now)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!("SELECT {SCHEDULE_COLUMNS} FROM work_schedules WHERE id = ?");
        sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_year_month<'e, E>(
        executor: E,
        year: i32,
        month: u32,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query =
            format!("SELECT {SCHEDULE_COLUMNS} FROM work_schedules WHERE year = ? AND month = ?");
        sqlx::query_as::<_, Schedule>(&query)
            .bind(year)
            .bind(month)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query =
            format!("SELECT {SCHEDULE_COLUMNS} FROM work_schedules ORDER BY year, month");
        sqlx::query_as::<_, Schedule>(&query).fetch_all(executor).await
    }

    pub async fn list_by_year<'e, E>(executor: E, year: i32) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM work_schedules WHERE year = ? ORDER BY month"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(year)
            .fetch_all(executor)
            .await
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM work_schedules WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
