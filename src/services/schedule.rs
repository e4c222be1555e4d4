use chrono::{Datelike, NaiveDate};
use sqlx::Sqlite;
use std::sync::Arc;
use tracing::{debug, info};

use crate::database::models::{MonthlyStat, NonWorkingDay, Schedule};
use crate::database::DatabaseManager;
use crate::error::{is_unique_violation, EngineError, EngineResult};
use crate::services::calendar::CalendarService;
use crate::services::recompute::{RecomputeJob, RecomputeQueue};
use crate::services::user::AdminGrant;
use crate::utils::datetime::{days_in_month, SharedClock};
use crate::utils::validation::{
    validate_minutes_per_day, validate_schedule_fields, validate_work_days, validate_year,
};

/// Outcome of [`ScheduleService::generate_for_year`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub schedules: Vec<Schedule>,
}

/// Per-day norm for a month: the schedule's value, or `default` when no schedule exists.
pub(crate) async fn minutes_per_day_for<'e, E>(
    executor: E,
    year: i32,
    month: u32,
    default: i64,
) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    Ok(Schedule::find_by_year_month(executor, year, month)
        .await?
        .map(|schedule| schedule.minutes_per_day)
        .unwrap_or(default))
}

#[derive(Clone)]
pub struct ScheduleService {
    db: Arc<DatabaseManager>,
    clock: SharedClock,
    queue: RecomputeQueue,
    calendar: CalendarService,
    default_minutes_per_day: i64,
}

impl ScheduleService {
    pub fn new(
        db: Arc<DatabaseManager>,
        clock: SharedClock,
        queue: RecomputeQueue,
        calendar: CalendarService,
        default_minutes_per_day: i64,
    ) -> Self {
        Self {
            db,
            clock,
            queue,
            calendar,
            default_minutes_per_day,
        }
    }

    pub async fn create(
        &self,
        _grant: &AdminGrant,
        year: i32,
        month: u32,
        work_days: i64,
        minutes_per_day: i64,
    ) -> EngineResult<Schedule> {
        validate_schedule_fields(year, month, work_days, minutes_per_day)?;
        self.insert_schedule(year, month, work_days, minutes_per_day).await
    }

    /// Rewrites work days and minutes per day; the (year, month) key never changes.
    pub async fn update(
        &self,
        _grant: &AdminGrant,
        id: i64,
        work_days: i64,
        minutes_per_day: i64,
    ) -> EngineResult<Schedule> {
        validate_work_days(work_days)?;
        validate_minutes_per_day(minutes_per_day)?;
        self.rewrite_schedule(id, work_days, minutes_per_day).await
    }

    /// Deletes a schedule nobody has recorded work against. Statistics are left as they are.
    pub async fn delete(&self, _grant: &AdminGrant, id: i64) -> EngineResult<Schedule> {
        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        let schedule = Schedule::find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("schedule", id))?;

        if MonthlyStat::month_has_worked_days(&mut *tx, schedule.year, schedule.month).await? {
            return Err(EngineError::ScheduleInUse {
                year: schedule.year,
                month: schedule.month,
            });
        }

        Schedule::delete(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id, year = schedule.year, month = schedule.month, "Deleted schedule");
        Ok(schedule)
    }

    pub async fn get(&self, id: i64) -> EngineResult<Schedule> {
        Schedule::find_by_id(&self.db.pool, id)
            .await?
            .ok_or_else(|| EngineError::not_found("schedule", id))
    }

    pub async fn get_by_year_month(&self, year: i32, month: u32) -> EngineResult<Option<Schedule>> {
        Ok(Schedule::find_by_year_month(&self.db.pool, year, month).await?)
    }

    pub async fn list_all(&self) -> EngineResult<Vec<Schedule>> {
        Ok(Schedule::list_all(&self.db.pool).await?)
    }

    pub async fn list_by_year(&self, year: i32) -> EngineResult<Vec<Schedule>> {
        Ok(Schedule::list_by_year(&self.db.pool, year).await?)
    }

    /// Calendar days of the month minus its non-working days.
    pub async fn working_days_in_month(&self, year: i32, month: u32) -> EngineResult<i64> {
        let days = days_in_month(year, month)
            .ok_or_else(|| EngineError::validation(format!("Invalid month {}-{}", year, month)))?;
        let non_working = NonWorkingDay::count_in_month(&self.db.pool, year, month).await?;
        Ok((i64::from(days) - non_working).max(0))
    }

    pub async fn is_working_day(&self, date: NaiveDate) -> EngineResult<bool> {
        Ok(!self.calendar.is_non_working_day(date).await?)
    }

    /// Required minutes for a session on `date`, straight from the month's schedule.
    pub async fn required_minutes_for(&self, date: NaiveDate) -> EngineResult<i64> {
        Ok(minutes_per_day_for(
            &self.db.pool,
            date.year(),
            date.month(),
            self.default_minutes_per_day,
        )
        .await?)
    }

    /// Creates or refreshes all twelve schedules of `year` from the calendar. Existing
    /// schedules keep their minutes per day; months already in sync are left alone.
    pub async fn generate_for_year(
        &self,
        _grant: &AdminGrant,
        year: i32,
        minutes_per_day: i64,
    ) -> EngineResult<GenerationReport> {
        validate_year(year)?;
        validate_minutes_per_day(minutes_per_day)?;

        let mut report = GenerationReport::default();
        for month in 1..=12 {
            let work_days = self.working_days_in_month(year, month).await?;
            let schedule = match self.get_by_year_month(year, month).await? {
                Some(existing) if existing.work_days == work_days => {
                    report.unchanged += 1;
                    existing
                }
                Some(existing) => {
                    report.updated += 1;
                    self.rewrite_schedule(existing.id, work_days, existing.minutes_per_day)
                        .await?
                }
                None => {
                    report.created += 1;
                    self.insert_schedule(year, month, work_days, minutes_per_day)
                        .await?
                }
            };
            report.schedules.push(schedule);
        }

        info!(
            year,
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            "Generated schedules from calendar"
        );
        Ok(report)
    }

    /// Re-derives work days of every stored schedule from the calendar. Returns how many
    /// schedules changed.
    pub async fn reconcile_all_from_calendar(&self, _grant: &AdminGrant) -> EngineResult<u32> {
        let mut changed = 0;
        for schedule in self.list_all().await? {
            let work_days = self.working_days_in_month(schedule.year, schedule.month).await?;
            if work_days != schedule.work_days {
                debug!(
                    id = schedule.id,
                    from = schedule.work_days,
                    to = work_days,
                    "Schedule drifted from calendar"
                );
                self.rewrite_schedule(schedule.id, work_days, schedule.minutes_per_day)
                    .await?;
                changed += 1;
            }
        }
        info!(changed, "Reconciled schedules with calendar");
        Ok(changed)
    }

    async fn insert_schedule(
        &self,
        year: i32,
        month: u32,
        work_days: i64,
        minutes_per_day: i64,
    ) -> EngineResult<Schedule> {
        let now = self.clock.now();
        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        if Schedule::find_by_year_month(&mut *tx, year, month).await?.is_some() {
            return Err(EngineError::DuplicateKey { year, month });
        }

        let schedule = Schedule::insert(&mut *tx, year, month, work_days, minutes_per_day, now)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    EngineError::DuplicateKey { year, month }
                } else {
                    EngineError::from(e)
                }
            })?;

        let job = RecomputeJob::ScheduleChanged {
            schedule_id: schedule.id,
        };
        let marker_id = job.record(&mut *tx, now).await?;
        tx.commit().await?;
        self.queue.dispatch(marker_id, job);

        info!(
            id = schedule.id,
            year,
            month,
            work_days,
            minutes_per_day,
            "Created schedule"
        );
        Ok(schedule)
    }

    async fn rewrite_schedule(
        &self,
        id: i64,
        work_days: i64,
        minutes_per_day: i64,
    ) -> EngineResult<Schedule> {
        let now = self.clock.now();
        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        let schedule = Schedule::update_body(&mut *tx, id, work_days, minutes_per_day, now)
            .await?
            .ok_or_else(|| EngineError::not_found("schedule", id))?;

        let job = RecomputeJob::ScheduleChanged { schedule_id: id };
        let marker_id = job.record(&mut *tx, now).await?;
        tx.commit().await?;
        self.queue.dispatch(marker_id, job);

        info!(
            id,
            year = schedule.year,
            month = schedule.month,
            work_days,
            minutes_per_day,
            "Updated schedule"
        );
        Ok(schedule)
    }
}
