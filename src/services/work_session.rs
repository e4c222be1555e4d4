//! Clock-in/out state machine over the session ledger.
//!
//! A user's day goes `none -> active -> completed`. Absence sessions are written by
//! [`crate::services::absence::AbsenceService`] and never pass through here.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::info;

use crate::database::models::{worked_minutes_between, NonWorkingDay, WorkSession};
use crate::database::DatabaseManager;
use crate::error::{database_message, is_unique_violation, EngineError, EngineResult};
use crate::services::recompute::{RecomputeJob, RecomputeQueue};
use crate::services::EngineSettings;
use crate::utils::datetime::{month_bounds, SharedClock};
use crate::utils::validation::validate_minutes_per_day;

/// Non-fatal annotations attached to a successful clock operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockWarning {
    /// The timestamp lies this many hours in the past.
    Backdated { hours: i64 },
    /// Clock-out on a non-working day, accepted after confirmation.
    HolidayWork(NaiveDate),
}

#[derive(Debug, Clone)]
pub struct ClockInOutcome {
    pub session: WorkSession,
    pub warnings: Vec<ClockWarning>,
}

#[derive(Debug, Clone)]
pub struct ClockOutOutcome {
    pub session: WorkSession,
    pub warnings: Vec<ClockWarning>,
}

#[derive(Clone)]
pub struct WorkSessionService {
    db: Arc<DatabaseManager>,
    clock: SharedClock,
    queue: RecomputeQueue,
    settings: EngineSettings,
}

impl WorkSessionService {
    pub fn new(
        db: Arc<DatabaseManager>,
        clock: SharedClock,
        queue: RecomputeQueue,
        settings: EngineSettings,
    ) -> Self {
        Self {
            db,
            clock,
            queue,
            settings,
        }
    }

    pub async fn clock_in(
        &self,
        user_id: i64,
        time: NaiveDateTime,
        required_minutes: i64,
    ) -> EngineResult<ClockInOutcome> {
        validate_minutes_per_day(required_minutes)?;
        let now = self.clock.now();
        reject_future(time, now)?;
        if time.year() < self.settings.epoch_year {
            return Err(EngineError::validation(format!(
                "Clock-in before {} is not accepted",
                self.settings.epoch_year
            )));
        }

        let date = time.date();
        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        if WorkSession::find_active_by_user(&mut *tx, user_id).await?.is_some() {
            return Err(EngineError::AlreadyActive);
        }
        if NonWorkingDay::exists(&mut *tx, date).await? {
            return Err(EngineError::NonWorkingDay(date));
        }
        if WorkSession::find_by_user_and_date(&mut *tx, user_id, date).await?.is_some() {
            return Err(EngineError::DateOccupied(date));
        }

        let session = WorkSession::insert_active(&mut *tx, user_id, time, required_minutes, now)
            .await
            .map_err(|e| {
                if !is_unique_violation(&e) {
                    EngineError::from(e)
                } else if database_message(&e).contains("work_sessions.date") {
                    EngineError::DateOccupied(date)
                } else {
                    EngineError::AlreadyActive
                }
            })?;
        tx.commit().await?;

        info!(user_id, session_id = session.id, %time, required_minutes, "Clocked in");
        Ok(ClockInOutcome {
            session,
            warnings: self.backdate_warning(time, now).into_iter().collect(),
        })
    }

    /// Closes the user's active session. On a non-working day the call fails with
    /// `HolidayConfirmationRequired` unless `confirm_holiday` is set.
    pub async fn clock_out(
        &self,
        user_id: i64,
        time: NaiveDateTime,
        confirm_holiday: bool,
    ) -> EngineResult<ClockOutOutcome> {
        let now = self.clock.now();
        reject_future(time, now)?;

        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        let active = WorkSession::find_active_by_user(&mut *tx, user_id)
            .await?
            .ok_or(EngineError::NoActiveSession)?;

        if time < active.clock_in_time {
            return Err(EngineError::TimeBeforeClockIn {
                clock_in: active.clock_in_time,
                clock_out: time,
            });
        }

        let mut warnings = Vec::new();
        let clock_out_date = time.date();
        if NonWorkingDay::exists(&mut *tx, clock_out_date).await? {
            if !confirm_holiday {
                return Err(EngineError::HolidayConfirmationRequired(clock_out_date));
            }
            warnings.push(ClockWarning::HolidayWork(clock_out_date));
        }

        let worked = worked_minutes_between(active.clock_in_time, time);
        let diff = worked - active.required_minutes;
        let session = WorkSession::complete(&mut *tx, active.id, time, worked, diff, now)
            .await?
            .ok_or(EngineError::NoActiveSession)?;

        let job = RecomputeJob::Worked {
            user_id,
            year: session.date.year(),
            month: session.date.month(),
        };
        let marker_id = job.record(&mut *tx, now).await?;
        tx.commit().await?;
        self.queue.dispatch(marker_id, job);

        info!(
            user_id,
            session_id = session.id,
            worked_minutes = worked,
            diff_minutes = diff,
            "Clocked out"
        );
        warnings.extend(self.backdate_warning(time, now));
        Ok(ClockOutOutcome { session, warnings })
    }

    pub async fn active_session(&self, user_id: i64) -> EngineResult<Option<WorkSession>> {
        Ok(WorkSession::find_active_by_user(&self.db.pool, user_id).await?)
    }

    pub async fn session_for_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> EngineResult<Option<WorkSession>> {
        Ok(WorkSession::find_by_user_and_date(&self.db.pool, user_id, date).await?)
    }

    /// Most recent sessions first.
    pub async fn history(&self, user_id: i64, limit: i64) -> EngineResult<Vec<WorkSession>> {
        Ok(WorkSession::list_by_user(&self.db.pool, user_id, limit.clamp(1, 100)).await?)
    }

    pub async fn month_sessions(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> EngineResult<Vec<WorkSession>> {
        let (first, last) = month_bounds(year, month)
            .ok_or_else(|| EngineError::validation(format!("Invalid month {}-{}", year, month)))?;
        Ok(WorkSession::list_by_user_between(&self.db.pool, user_id, first, last).await?)
    }

    fn backdate_warning(&self, time: NaiveDateTime, now: NaiveDateTime) -> Option<ClockWarning> {
        let age = now.signed_duration_since(time);
        if age > Duration::hours(self.settings.backdate_warning_hours) {
            Some(ClockWarning::Backdated {
                hours: age.num_hours(),
            })
        } else {
            None
        }
    }
}

fn reject_future(time: NaiveDateTime, now: NaiveDateTime) -> EngineResult<()> {
    if time > now {
        return Err(EngineError::validation(format!(
            "Time {} is in the future",
            time.format("%d.%m.%Y %H:%M")
        )));
    }
    Ok(())
}
