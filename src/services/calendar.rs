use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::database::models::NonWorkingDay;
use crate::database::DatabaseManager;
use crate::error::EngineResult;
use crate::services::calendar_feed::CalendarFeed;
use crate::services::user::AdminGrant;
use crate::utils::logging::log_database_operation;
use crate::utils::validation::validate_month;

/// Stored snapshot of the production calendar.
#[derive(Clone)]
pub struct CalendarService {
    db: Arc<DatabaseManager>,
}

impl CalendarService {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    pub async fn is_non_working_day(&self, date: NaiveDate) -> EngineResult<bool> {
        Ok(NonWorkingDay::exists(&self.db.pool, date).await?)
    }

    pub async fn non_working_days_in_month(&self, year: i32, month: u32) -> EngineResult<i64> {
        validate_month(month)?;
        Ok(NonWorkingDay::count_in_month(&self.db.pool, year, month).await?)
    }

    pub async fn non_working_days_in_month_list(
        &self,
        year: i32,
        month: u32,
    ) -> EngineResult<Vec<NaiveDate>> {
        validate_month(month)?;
        let days = NonWorkingDay::list_in_month(&self.db.pool, year, month).await?;
        Ok(days.into_iter().map(|day| day.date).collect())
    }

    pub async fn snapshot_size(&self) -> EngineResult<i64> {
        Ok(NonWorkingDay::count_all(&self.db.pool).await?)
    }

    /// Replaces the whole stored set with `dates` in one transaction. Dates missing from
    /// the new snapshot become working days. Returns the number of distinct dates stored.
    pub async fn load_snapshot(&self, _grant: &AdminGrant, dates: &[NaiveDate]) -> EngineResult<u64> {
        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        let removed = NonWorkingDay::delete_all(&mut *tx).await?;
        let mut stored = 0;
        for date in dates {
            if NonWorkingDay::insert(&mut *tx, *date).await? {
                stored += 1;
            }
        }

        tx.commit().await?;
        log_database_operation(
            "REPLACE",
            "non_working_days",
            Some(&format!("removed {removed}, stored {stored}")),
        );
        info!(removed, stored, "Replaced non-working day snapshot");
        Ok(stored)
    }

    /// Parses a calendar feed file and installs it as the new snapshot.
    pub async fn load_from_feed(
        &self,
        grant: &AdminGrant,
        path: impl AsRef<Path>,
    ) -> EngineResult<u64> {
        let feed = CalendarFeed::from_path(path)?;
        let dates = feed.non_working_dates()?;
        info!(year = feed.year, dates = dates.len(), "Parsed calendar feed");
        self.load_snapshot(grant, &dates).await
    }
}
