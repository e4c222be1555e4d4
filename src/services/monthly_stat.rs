use chrono::Datelike;
use std::sync::Arc;
use tracing::{debug, info};

use crate::database::models::{MonthlyStat, Schedule, WorkSession};
use crate::database::DatabaseManager;
use crate::error::{EngineError, EngineResult};
use crate::services::recompute::RecomputeJob;
use crate::utils::datetime::{month_bounds, SharedClock};
use crate::utils::validation::validate_month;

/// Keeps `user_monthly_stats` in line with schedules and the session ledger.
#[derive(Clone)]
pub struct StatsAggregator {
    db: Arc<DatabaseManager>,
    clock: SharedClock,
}

impl StatsAggregator {
    pub fn new(db: Arc<DatabaseManager>, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    pub async fn apply(&self, job: RecomputeJob) -> EngineResult<()> {
        match job {
            RecomputeJob::Worked {
                user_id,
                year,
                month,
            } => self.recompute_worked(user_id, year, month).await.map(|_| ()),
            RecomputeJob::ScheduleChanged { schedule_id } => {
                self.fan_out_schedule_change(schedule_id).await.map(|_| ())
            }
            RecomputeJob::NewUser { user_id } => self.seed_for_new_user(user_id).await.map(|_| ()),
        }
    }

    /// Re-sums finished sessions of the month and rewrites the worked side.
    pub async fn recompute_worked(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> EngineResult<MonthlyStat> {
        validate_month(month)?;
        let (first, last) = month_bounds(year, month)
            .ok_or_else(|| EngineError::validation(format!("Invalid month {}-{}", year, month)))?;

        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        let worked = WorkSession::worked_totals(&mut *tx, user_id, first, last).await?;
        let planned = match Schedule::find_by_year_month(&mut *tx, year, month).await? {
            Some(schedule) => (schedule.work_days, schedule.total_minutes),
            None => MonthlyStat::find(&mut *tx, user_id, year, month)
                .await?
                .map(|stat| (stat.planned_days, stat.planned_minutes))
                .unwrap_or((0, 0)),
        };

        let stat = MonthlyStat::upsert_worked(
            &mut *tx,
            user_id,
            year,
            month,
            planned,
            worked,
            self.clock.now(),
        )
        .await?;
        tx.commit().await?;

        debug!(
            user_id,
            year,
            month,
            worked_minutes = stat.worked_minutes,
            overtime = stat.overtime_minutes,
            deficit = stat.deficit_minutes,
            "Recomputed worked time"
        );
        Ok(stat)
    }

    /// Creates a zero-worked row for every existing schedule.
    pub async fn seed_for_new_user(&self, user_id: i64) -> EngineResult<u64> {
        let _write = self.db.write_lock().await;
        let created =
            MonthlyStat::seed_user_from_schedules(&self.db.pool, user_id, self.clock.now()).await?;
        debug!(user_id, created, "Seeded monthly statistics for user");
        Ok(created)
    }

    /// Rewrites the planned side of every user's row for the schedule's month, creating
    /// missing rows. A schedule deleted before the job ran is a no-op.
    pub async fn fan_out_schedule_change(&self, schedule_id: i64) -> EngineResult<u64> {
        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        let Some(schedule) = Schedule::find_by_id(&mut *tx, schedule_id).await? else {
            debug!(schedule_id, "Schedule vanished before fan-out");
            return Ok(0);
        };

        let now = self.clock.now();
        let seeded = MonthlyStat::seed_month_for_all_users(
            &mut *tx,
            schedule.year,
            schedule.month,
            schedule.work_days,
            schedule.total_minutes,
            now,
        )
        .await?;
        let touched = MonthlyStat::apply_planned_to_all(
            &mut *tx,
            schedule.year,
            schedule.month,
            schedule.work_days,
            schedule.total_minutes,
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            schedule_id,
            year = schedule.year,
            month = schedule.month,
            seeded,
            touched,
            "Fanned out schedule change"
        );
        Ok(touched)
    }

    pub async fn get(&self, user_id: i64, year: i32, month: u32) -> EngineResult<Option<MonthlyStat>> {
        Ok(MonthlyStat::find(&self.db.pool, user_id, year, month).await?)
    }

    /// Statistics up to the current month, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> EngineResult<Vec<MonthlyStat>> {
        let today = self.clock.today();
        Ok(MonthlyStat::list_by_user_until(&self.db.pool, user_id, today.year(), today.month()).await?)
    }
}

/// Share of the planned minutes already worked, capped at 100.
pub fn completion_percentage(stat: &MonthlyStat) -> f64 {
    if stat.planned_minutes <= 0 {
        return 0.0;
    }
    let percentage = stat.worked_minutes as f64 / stat.planned_minutes as f64 * 100.0;
    percentage.min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stat(planned: i64, worked: i64) -> MonthlyStat {
        MonthlyStat {
            id: 1,
            user_id: 1,
            year: 2026,
            month: 2,
            planned_days: 19,
            planned_minutes: planned,
            worked_days: 1,
            worked_minutes: worked,
            overtime_minutes: 0,
            deficit_minutes: 0,
            updated_at: NaiveDate::from_ymd_opt(2026, 2, 2)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(&stat(1000, 250)), 25.0);
        assert_eq!(completion_percentage(&stat(1000, 1500)), 100.0);
        assert_eq!(completion_percentage(&stat(0, 300)), 0.0);
    }
}
