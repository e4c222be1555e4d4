//! Work queue for statistics recomputation.
//!
//! Every triggering write stores a `pending_recomputes` marker in its own transaction and,
//! after commit, sends the job to a single [`RecomputeWorker`]. The worker drops the marker
//! once the job succeeded, so anything lost to a crash is re-sent by
//! [`RecomputeQueue::requeue_pending`].

use chrono::NaiveDateTime;
use sqlx::Sqlite;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::database::models::PendingRecompute;
use crate::database::DatabaseManager;
use crate::error::EngineResult;
use crate::services::monthly_stat::StatsAggregator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeJob {
    /// Re-sum the worked side of one user's month.
    Worked { user_id: i64, year: i32, month: u32 },
    /// Push a schedule's planned figures to every user of its month.
    ScheduleChanged { schedule_id: i64 },
    /// Give a freshly registered user a row for every scheduled month.
    NewUser { user_id: i64 },
}

impl RecomputeJob {
    fn tag(&self) -> &'static str {
        match self {
            RecomputeJob::Worked { .. } => "worked",
            RecomputeJob::ScheduleChanged { .. } => "schedule_changed",
            RecomputeJob::NewUser { .. } => "new_user",
        }
    }

    fn from_marker(marker: &PendingRecompute) -> Option<Self> {
        match marker.job.as_str() {
            "worked" => Some(RecomputeJob::Worked {
                user_id: marker.user_id?,
                year: marker.year?,
                month: marker.month?,
            }),
            "schedule_changed" => Some(RecomputeJob::ScheduleChanged {
                schedule_id: marker.schedule_id?,
            }),
            "new_user" => Some(RecomputeJob::NewUser {
                user_id: marker.user_id?,
            }),
            _ => None,
        }
    }

    /// Persists the marker for this job. Call inside the triggering transaction.
    pub async fn record<'e, E>(&self, executor: E, now: NaiveDateTime) -> Result<i64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let (user_id, year, month, schedule_id) = match *self {
            RecomputeJob::Worked {
                user_id,
                year,
                month,
            } => (Some(user_id), Some(year), Some(month), None),
            RecomputeJob::ScheduleChanged { schedule_id } => (None, None, None, Some(schedule_id)),
            RecomputeJob::NewUser { user_id } => (Some(user_id), None, None, None),
        };
        PendingRecompute::insert(executor, self.tag(), user_id, year, month, schedule_id, now).await
    }
}

pub(crate) enum Envelope {
    Job { marker_id: i64, job: RecomputeJob },
    Flush(oneshot::Sender<()>),
}

/// Sending half of the recompute queue; cheap to clone.
#[derive(Clone)]
pub struct RecomputeQueue {
    sender: mpsc::UnboundedSender<Envelope>,
    db: Arc<DatabaseManager>,
}

impl RecomputeQueue {
    pub(crate) fn channel(db: Arc<DatabaseManager>) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, db }, receiver)
    }

    /// Hands a committed job to the worker. A closed channel only logs: the marker stays
    /// in storage and the next sweep picks it up.
    pub fn dispatch(&self, marker_id: i64, job: RecomputeJob) {
        if self.sender.send(Envelope::Job { marker_id, job }).is_err() {
            warn!(marker_id, ?job, "Recompute worker is gone; job left for the sweep");
        }
    }

    /// Resolves once every job sent before this call has been processed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Envelope::Flush(done)).is_err() {
            return;
        }
        let _ = wait.await;
    }

    /// Re-sends every marker still in storage. Returns how many were queued.
    pub async fn requeue_pending(&self) -> EngineResult<usize> {
        let markers = PendingRecompute::list_all(&self.db.pool).await?;
        let mut queued = 0;
        for marker in &markers {
            match RecomputeJob::from_marker(marker) {
                Some(job) => {
                    self.dispatch(marker.id, job);
                    queued += 1;
                }
                None => {
                    warn!(marker_id = marker.id, job = %marker.job, "Dropping malformed recompute marker");
                    let _write = self.db.write_lock().await;
                    PendingRecompute::delete(&self.db.pool, marker.id).await?;
                }
            }
        }
        if queued > 0 {
            debug!(queued, "Re-queued pending recompute jobs");
        }
        Ok(queued)
    }

    pub async fn pending_count(&self) -> EngineResult<i64> {
        Ok(PendingRecompute::count(&self.db.pool).await?)
    }
}

/// Receiving half; processes jobs one at a time.
pub struct RecomputeWorker {
    receiver: mpsc::UnboundedReceiver<Envelope>,
    stats: StatsAggregator,
    db: Arc<DatabaseManager>,
}

impl RecomputeWorker {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<Envelope>,
        stats: StatsAggregator,
        db: Arc<DatabaseManager>,
    ) -> Self {
        Self { receiver, stats, db }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until every queue handle has been dropped.
    pub async fn run(mut self) {
        while let Some(envelope) = self.receiver.recv().await {
            match envelope {
                Envelope::Job { marker_id, job } => self.process(marker_id, job).await,
                Envelope::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("Recompute worker stopped");
    }

    async fn process(&self, marker_id: i64, job: RecomputeJob) {
        if let Err(e) = self.stats.apply(job).await {
            match job {
                RecomputeJob::Worked {
                    user_id,
                    year,
                    month,
                } => error!(user_id, year, month, error = %e, "Worked-time recompute failed"),
                RecomputeJob::ScheduleChanged { schedule_id } => {
                    error!(schedule_id, error = %e, "Schedule fan-out failed")
                }
                RecomputeJob::NewUser { user_id } => {
                    error!(user_id, error = %e, "Seeding statistics for new user failed")
                }
            }
            return;
        }

        let _write = self.db.write_lock().await;
        if let Err(e) = PendingRecompute::delete(&self.db.pool, marker_id).await {
            warn!(marker_id, error = %e, "Recompute succeeded but its marker could not be removed");
        }
    }
}
