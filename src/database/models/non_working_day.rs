use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite};

/// One non-working date of the production calendar.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct NonWorkingDay {
    pub id: i64,
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl NonWorkingDay {
    pub async fn exists<'e, E>(executor: E, date: NaiveDate) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM non_working_days WHERE date = ?")
                .bind(date)
                .fetch_optional(executor)
                .await?;
        Ok(found.is_some())
    }

    pub async fn count_in_month<'e, E>(
        executor: E,
        year: i32,
        month: u32,
    ) -> Result<i64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM non_working_days WHERE year = ? AND month = ?")
            .bind(year)
            .bind(month)
            .fetch_one(executor)
            .await
    }

    pub async fn list_in_month<'e, E>(
        executor: E,
        year: i32,
        month: u32,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, NonWorkingDay>(
            "SELECT id, date, year, month, day FROM non_working_days
             WHERE year = ? AND month = ?
             ORDER BY date",
        )
        .bind(year)
        .bind(month)
        .fetch_all(executor)
        .await
    }

    pub async fn count_all<'e, E>(executor: E) -> Result<i64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM non_working_days")
            .fetch_one(executor)
            .await
    }

    pub async fn delete_all<'e, E>(executor: E) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM non_working_days")
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Inserts a date; a date already present is ignored.
    pub async fn insert<'e, E>(executor: E, date: NaiveDate) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO non_working_days (date, year, month, day) VALUES (?, ?, ?, ?)
             ON CONFLICT (date) DO NOTHING",
        )
        .bind(date)
        .bind(date.year())
        .bind(date.month())
        .bind(date.day())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
