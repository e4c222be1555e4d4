use tokio_cron_scheduler::{Job, JobScheduler};

use crate::services::recompute::RecomputeQueue;

/// Periodically re-sends recompute jobs whose markers survived, e.g. after a crash
/// between commit and processing.
pub struct RecomputeSweep {
    queue: RecomputeQueue,
    schedule: String,
    scheduler: JobScheduler,
}

impl RecomputeSweep {
    pub async fn new(
        queue: RecomputeQueue,
        schedule: &str,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            queue,
            schedule: schedule.to_string(),
            scheduler,
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let queue = self.queue.clone();

        let sweep_job = Job::new_async(self.schedule.as_str(), move |_uuid, _l| {
            let queue = queue.clone();
            Box::pin(async move {
                match queue.requeue_pending().await {
                    Ok(0) => {}
                    Ok(count) => tracing::info!("Recompute sweep re-queued {} jobs", count),
                    Err(e) => tracing::error!("Recompute sweep failed: {}", e),
                }
            })
        })?;

        self.scheduler.add(sweep_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Recompute sweep started with schedule '{}'", self.schedule);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    /// Runs one sweep immediately.
    pub async fn sweep_now(&self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.queue.requeue_pending().await?)
    }
}
