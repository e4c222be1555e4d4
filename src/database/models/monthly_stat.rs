use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite};

/// Per-user rollup of planned against worked time for one month.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MonthlyStat {
    pub id: i64,
    pub user_id: i64,
    pub year: i32,
    pub month: u32,
    pub planned_days: i64,
    pub planned_minutes: i64,
    pub worked_days: i64,
    pub worked_minutes: i64,
    pub overtime_minutes: i64,
    pub deficit_minutes: i64,
    pub updated_at: NaiveDateTime,
}

/// Overtime and deficit as non-negative magnitudes; at most one is nonzero.
pub fn balance(planned_minutes: i64, worked_minutes: i64) -> (i64, i64) {
    let delta = worked_minutes - planned_minutes;
    (delta.max(0), (-delta).max(0))
}

const STAT_COLUMNS: &str = "id, user_id, year, month, planned_days, planned_minutes, worked_days, \
     worked_minutes, overtime_minutes, deficit_minutes, updated_at";

impl MonthlyStat {
    /// Signed balance, positive for overtime.
    pub fn net_minutes(&self) -> i64 {
        self.overtime_minutes - self.deficit_minutes
    }

    pub async fn find<'e, E>(
        executor: E,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {STAT_COLUMNS} FROM user_monthly_stats WHERE user_id = ? AND year = ? AND month = ?"
        );
        sqlx::query_as::<_, MonthlyStat>(&query)
            .bind(user_id)
            .bind(year)
            .bind(month)
            .fetch_optional(executor)
            .await
    }

    /// Months up to and including `(year, month)`, newest first.
    pub async fn list_by_user_until<'e, E>(
        executor: E,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {STAT_COLUMNS} FROM user_monthly_stats
             WHERE user_id = ? AND (year < ? OR (year = ? AND month <= ?))
             ORDER BY year DESC, month DESC"
        );
        sqlx::query_as::<_, MonthlyStat>(&query)
            .bind(user_id)
            .bind(year)
            .bind(year)
            .bind(month)
            .fetch_all(executor)
            .await
    }

    /// Writes the worked side, keeping whatever planned figures are already stored.
    pub async fn upsert_worked<'e, E>(
        executor: E,
        user_id: i64,
        year: i32,
        month: u32,
        planned: (i64, i64),
        worked: (i64, i64),
        now: NaiveDateTime,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let (planned_days, planned_minutes) = planned;
        let (worked_days, worked_minutes) = worked;
        let (overtime, deficit) = balance(planned_minutes, worked_minutes);
        let query = format!(
            "INSERT INTO user_monthly_stats (user_id, year, month, planned_days, planned_minutes,
                 worked_days, worked_minutes, overtime_minutes, deficit_minutes, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, year, month) DO UPDATE SET
                 planned_days = excluded.planned_days,
                 planned_minutes = excluded.planned_minutes,
                 worked_days = excluded.worked_days,
                 worked_minutes = excluded.worked_minutes,
                 overtime_minutes = excluded.overtime_minutes,
                 deficit_minutes = excluded.deficit_minutes,
                 updated_at = excluded.updated_at
             RETURNING {STAT_COLUMNS}"
        );
        sqlx::query_as::<_, MonthlyStat>(&query)
            .bind(user_id)
            .bind(year)
            .bind(month)
            .bind(planned_days)
            .bind(planned_minutes)
            .bind(worked_days)
            .bind(worked_minutes)
            .bind(overtime)
            .bind(deficit)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Rewrites the planned side for every user of the month and re-derives the balance
    /// from the worked figures already stored. Returns the number of rows touched.
    pub async fn apply_planned_to_all<'e, E>(
        executor: E,
        year: i32,
        month: u32,
        planned_days: i64,
        planned_minutes: i64,
        now: NaiveDateTime,
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE user_monthly_stats SET
                 planned_days = ?1,
                 planned_minutes = ?2,
                 overtime_minutes = MAX(worked_minutes - ?2, 0),
                 deficit_minutes = MAX(?2 - worked_minutes, 0),
                 updated_at = ?3
             WHERE year = ?4 AND month = ?5",
        )
        .bind(planned_days)
        .bind(planned_minutes)
        .bind(now)
        .bind(year)
        .bind(month)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Creates zero-worked rows for every user that has none for the month yet.
    pub async fn seed_month_for_all_users<'e, E>(
        executor: E,
        year: i32,
        month: u32,
        planned_days: i64,
        planned_minutes: i64,
        now: NaiveDateTime,
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO user_monthly_stats (user_id, year, month, planned_days, planned_minutes,
                 worked_days, worked_minutes, overtime_minutes, deficit_minutes, updated_at)
             SELECT id, ?1, ?2, ?3, ?4, 0, 0, 0, ?4, ?5 FROM users
             WHERE true
             ON CONFLICT (user_id, year, month) DO NOTHING",
        )
        .bind(year)
        .bind(month)
        .bind(planned_days)
        .bind(planned_minutes)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Creates zero-worked rows for one user and every existing schedule.
    pub async fn seed_user_from_schedules<'e, E>(
        executor: E,
        user_id: i64,
        now: NaiveDateTime,
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO user_monthly_stats (user_id, year, month, planned_days, planned_minutes,
                 worked_days, worked_minutes, overtime_minutes, deficit_minutes, updated_at)
             SELECT ?1, year, month, work_days, total_minutes, 0, 0, 0, total_minutes, ?2
             FROM work_schedules
             WHERE true
             ON CONFLICT (user_id, year, month) DO NOTHING",
        )
        .bind(user_id)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// True when any user has recorded work in the month.
    pub async fn month_has_worked_days<'e, E>(
        executor: E,
        year: i32,
        month: u32,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_monthly_stats WHERE year = ? AND month = ? AND worked_days > 0",
        )
        .bind(year)
        .bind(month)
        .fetch_one(executor)
        .await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_deficit() {
        assert_eq!(balance(15080, 510), (0, 14570));
        assert_eq!(balance(520, 510), (0, 10));
    }

    #[test]
    fn test_balance_overtime() {
        assert_eq!(balance(520, 600), (80, 0));
    }

    #[test]
    fn test_balance_exact() {
        assert_eq!(balance(520, 520), (0, 0));
        assert_eq!(balance(0, 0), (0, 0));
    }

    #[test]
    fn test_balance_is_exclusive_and_signed() {
        for (planned, worked) in [(0, 45), (480, 0), (10_000, 9_999), (300, 301)] {
            let (overtime, deficit) = balance(planned, worked);
            assert!(overtime == 0 || deficit == 0);
            assert!(overtime >= 0 && deficit >= 0);
            assert_eq!(overtime - deficit, worked - planned);
        }
    }
}
