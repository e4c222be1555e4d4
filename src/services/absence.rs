use chrono::{Datelike, NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::database::models::{AbsenceKind, AbsencePeriod, AbsenceSessionDraft, WorkSession};
use crate::database::DatabaseManager;
use crate::error::{is_unique_violation, EngineError, EngineResult};
use crate::services::recompute::{RecomputeJob, RecomputeQueue};
use crate::services::schedule::minutes_per_day_for;
use crate::services::user::Caller;
use crate::utils::datetime::{dates_between, months_between, SharedClock};
use crate::utils::validation::validate_absence_range;

/// Nominal window shown for synthesized absence sessions.
const ABSENCE_DAY_START: (u32, u32) = (9, 0);
const ABSENCE_DAY_END: (u32, u32) = (17, 40);

/// A stored absence period together with the sessions it produced.
#[derive(Debug, Clone)]
pub struct AbsenceRecord {
    pub period: AbsencePeriod,
    pub sessions: Vec<WorkSession>,
}

/// Periods of one kind with their total day count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsenceGroup {
    pub kind: AbsenceKind,
    pub periods: Vec<AbsencePeriod>,
    pub total_days: i64,
}

#[derive(Clone)]
pub struct AbsenceService {
    db: Arc<DatabaseManager>,
    clock: SharedClock,
    queue: RecomputeQueue,
    default_minutes_per_day: i64,
}

impl AbsenceService {
    pub fn new(
        db: Arc<DatabaseManager>,
        clock: SharedClock,
        queue: RecomputeQueue,
        default_minutes_per_day: i64,
    ) -> Self {
        Self {
            db,
            clock,
            queue,
            default_minutes_per_day,
        }
    }

    /// Vacations may only start today or later.
    pub async fn add_vacation(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<AbsenceRecord> {
        if start < self.clock.today() {
            return Err(EngineError::validation("Vacation cannot start in the past"));
        }
        self.add_period(user_id, AbsenceKind::Vacation, start, end).await
    }

    /// Sick leave may be backdated.
    pub async fn add_sick_leave(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<AbsenceRecord> {
        self.add_period(user_id, AbsenceKind::SickLeave, start, end).await
    }

    pub async fn add_day_off(&self, user_id: i64, date: NaiveDate) -> EngineResult<AbsenceRecord> {
        self.add_period(user_id, AbsenceKind::DayOff, date, date).await
    }

    /// Periods grouped by kind, kinds without periods omitted.
    pub async fn list_for_user(&self, user_id: i64) -> EngineResult<Vec<AbsenceGroup>> {
        let periods = AbsencePeriod::list_by_user(&self.db.pool, user_id).await?;
        Ok(group_by_kind(periods))
    }

    pub async fn current_absence(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> EngineResult<Option<AbsencePeriod>> {
        Ok(AbsencePeriod::find_overlapping(&self.db.pool, user_id, date, date).await?)
    }

    /// Deletes a period and its synthesized sessions. Only the owner or an admin may do so.
    pub async fn delete(&self, caller: &Caller, period_id: i64) -> EngineResult<AbsencePeriod> {
        let now = self.clock.now();
        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        let period = AbsencePeriod::find_by_id(&mut *tx, period_id)
            .await?
            .ok_or_else(|| EngineError::not_found("absence period", period_id))?;
        if period.user_id != caller.user_id && !caller.is_admin() {
            return Err(EngineError::Forbidden);
        }

        let removed = WorkSession::delete_by_absence_period(&mut *tx, period.id).await?;
        AbsencePeriod::delete(&mut *tx, period.id).await?;

        let mut markers = Vec::new();
        for (year, month) in months_between(period.start_date, period.end_date) {
            let job = RecomputeJob::Worked {
                user_id: period.user_id,
                year,
                month,
            };
            markers.push((job.record(&mut *tx, now).await?, job));
        }
        tx.commit().await?;
        for (marker_id, job) in markers {
            self.queue.dispatch(marker_id, job);
        }

        info!(
            period_id,
            user_id = period.user_id,
            removed_sessions = removed,
            "Deleted absence period"
        );
        Ok(period)
    }

    async fn add_period(
        &self,
        user_id: i64,
        kind: AbsenceKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<AbsenceRecord> {
        validate_absence_range(start, end)?;

        let now = self.clock.now();
        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        if let Some(existing) = AbsencePeriod::find_overlapping(&mut *tx, user_id, start, end).await? {
            return Err(EngineError::AbsenceOverlap {
                start: existing.start_date,
                end: existing.end_date,
            });
        }
        if let Some(date) = WorkSession::first_occupied_date(&mut *tx, user_id, start, end).await? {
            return Err(EngineError::DateOccupied(date));
        }

        let period = AbsencePeriod::insert(&mut *tx, user_id, start, end, kind, now).await?;

        let mut minutes_by_month: HashMap<(i32, u32), i64> = HashMap::new();
        let mut sessions = Vec::with_capacity(period.days() as usize);
        for date in dates_between(start, end) {
            let key = (date.year(), date.month());
            let required_minutes = match minutes_by_month.get(&key).copied() {
                Some(minutes) => minutes,
                None => {
                    let minutes =
                        minutes_per_day_for(&mut *tx, key.0, key.1, self.default_minutes_per_day)
                            .await?;
                    minutes_by_month.insert(key, minutes);
                    minutes
                }
            };

            let draft = AbsenceSessionDraft {
                user_id,
                date,
                clock_in_time: date.and_time(nominal_time(ABSENCE_DAY_START)),
                clock_out_time: date.and_time(nominal_time(ABSENCE_DAY_END)),
                required_minutes,
                session_kind: kind.session_kind(),
                absence_period_id: period.id,
            };
            let session = WorkSession::insert_absence(&mut *tx, &draft, now)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        EngineError::DateOccupied(date)
                    } else {
                        EngineError::from(e)
                    }
                })?;
            sessions.push(session);
        }

        let mut markers = Vec::new();
        for (year, month) in months_between(start, end) {
            let job = RecomputeJob::Worked {
                user_id,
                year,
                month,
            };
            markers.push((job.record(&mut *tx, now).await?, job));
        }
        tx.commit().await?;
        for (marker_id, job) in markers {
            self.queue.dispatch(marker_id, job);
        }

        info!(
            period_id = period.id,
            user_id,
            kind = kind.label(),
            %start,
            %end,
            sessions = sessions.len(),
            "Created absence period"
        );
        Ok(AbsenceRecord { period, sessions })
    }
}

fn nominal_time((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn group_by_kind(periods: Vec<AbsencePeriod>) -> Vec<AbsenceGroup> {
    AbsenceKind::ALL
        .iter()
        .filter_map(|kind| {
            let periods: Vec<AbsencePeriod> =
                periods.iter().filter(|p| p.kind == *kind).cloned().collect();
            if periods.is_empty() {
                return None;
            }
            let total_days = periods.iter().map(AbsencePeriod::days).sum();
            Some(AbsenceGroup {
                kind: *kind,
                periods,
                total_days,
            })
        })
        .collect()
}
