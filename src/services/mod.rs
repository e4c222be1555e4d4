pub mod absence;
pub mod calendar;
pub mod calendar_feed;
pub mod health;
pub mod monthly_stat;
pub mod recompute;
pub mod schedule;
pub mod sweep;
pub mod user;
pub mod work_session;

use std::sync::Arc;

use crate::database::DatabaseManager;
use crate::utils::datetime::SharedClock;

use self::absence::AbsenceService;
use self::calendar::CalendarService;
use self::monthly_stat::StatsAggregator;
use self::recompute::{RecomputeQueue, RecomputeWorker};
use self::schedule::ScheduleService;
use self::user::UserService;
use self::work_session::WorkSessionService;

/// Business rules that vary per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Earliest year accepted for clock-in.
    pub epoch_year: i32,
    /// Per-day norm for months without a schedule.
    pub default_minutes_per_day: i64,
    /// Clock timestamps older than this are accepted with a warning.
    pub backdate_warning_hours: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            epoch_year: 2026,
            default_minutes_per_day: 520,
            backdate_warning_hours: 24,
        }
    }
}

/// Every engine service, wired to one database, clock and recompute queue.
#[derive(Clone)]
pub struct Services {
    pub calendar: CalendarService,
    pub schedules: ScheduleService,
    pub sessions: WorkSessionService,
    pub absences: AbsenceService,
    pub stats: StatsAggregator,
    pub users: UserService,
    pub queue: RecomputeQueue,
    pub settings: EngineSettings,
    pub clock: SharedClock,
}

impl Services {
    /// Builds the services and the worker that drains their recompute queue. The worker
    /// must be spawned for statistics to follow writes.
    pub fn new(
        db: Arc<DatabaseManager>,
        settings: EngineSettings,
        clock: SharedClock,
    ) -> (Self, RecomputeWorker) {
        let (queue, receiver) = RecomputeQueue::channel(db.clone());
        let stats = StatsAggregator::new(db.clone(), clock.clone());
        let worker = RecomputeWorker::new(receiver, stats.clone(), db.clone());

        let calendar = CalendarService::new(db.clone());
        let schedules = ScheduleService::new(
            db.clone(),
            clock.clone(),
            queue.clone(),
            calendar.clone(),
            settings.default_minutes_per_day,
        );
        let sessions = WorkSessionService::new(db.clone(), clock.clone(), queue.clone(), settings);
        let absences = AbsenceService::new(
            db.clone(),
            clock.clone(),
            queue.clone(),
            settings.default_minutes_per_day,
        );
        let users = UserService::new(db, clock.clone(), queue.clone());

        let services = Self {
            calendar,
            schedules,
            sessions,
            absences,
            stats,
            users,
            queue,
            settings,
            clock,
        };
        (services, worker)
    }
}
