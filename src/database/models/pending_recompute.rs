use chrono::NaiveDateTime;
use sqlx::{FromRow, Sqlite};

/// Marker for a recompute job that was committed but not yet processed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PendingRecompute {
    pub id: i64,
    pub job: String, // worked | schedule_changed | new_user
    pub user_id: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub schedule_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

impl PendingRecompute {
    pub async fn insert<'e, E>(
        executor: E,
        job: &str,
        user_id: Option<i64>,
        year: Option<i32>,
        month: Option<u32>,
        schedule_id: Option<i64>,
        now: NaiveDateTime,
    ) -> Result<i64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar(
            "INSERT INTO pending_recomputes (job, user_id, year, month, schedule_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(job)
        .bind(user_id)
        .bind(year)
        .bind(month)
        .bind(schedule_id)
        .bind(now)
        .fetch_one(executor)
        .await
    }

    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, PendingRecompute>(
            "SELECT id, job, user_id, year, month, schedule_id, created_at
             FROM pending_recomputes ORDER BY id",
        )
        .fetch_all(executor)
        .await
    }

    pub async fn count<'e, E>(executor: E) -> Result<i64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM pending_recomputes")
            .fetch_one(executor)
            .await
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query("DELETE FROM pending_recomputes WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
