use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::progress::ProgressState;
use super::track_task::{TrackContext, TrackRetrievalTask};
use crate::domain::{RunSummary, TrackFailure, TrackLink, TrackOutcome};

/// Starts one retrieval task per queued link and waits for all of them.
pub struct DownloadScheduler {
    ctx: Arc<TrackContext>,
    in_flight: Arc<Semaphore>,
}

impl DownloadScheduler {
    /// `jobs` bounds how many tracks download at once; zero is treated as one.
    pub fn new(ctx: TrackContext, jobs: usize) -> Self {
        Self {
            ctx: Arc::new(ctx),
            in_flight: Arc::new(Semaphore::new(jobs.max(1))),
        }
    }

    /// Drain `links` until the producer closes it, then join every task.
    pub async fn run(
        &self,
        mut links: mpsc::Receiver<TrackLink>,
        progress: Arc<ProgressState>,
    ) -> RunSummary {
        let mut tasks = JoinSet::new();
        let mut next_index = 0;

        while let Some(link) = links.recv().await {
            // indices are handed out here, before the task exists
            let index = next_index;
            next_index += 1;

            // Never closed, so this only waits for a free slot
            let permit = self.in_flight.clone().acquire_owned().await.ok();

            let task = TrackRetrievalTask::new(self.ctx.clone(), index, link);
            let progress = progress.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = task.run().await;
                track_finished(&progress, &result);
                result
            });
        }

        log::debug!("dispatched {} tracks, waiting for them", next_index);

        let mut summary = RunSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => summary.record(result),
                Err(e) => {
                    log::error!("track task aborted: {}", e);
                    summary.aborted += 1;
                }
            }
        }

        // shared titles may have moved files reported earlier
        for path in &mut summary.saved {
            *path = self.ctx.names.current(path).await;
        }

        summary
    }
}

fn track_finished(progress: &ProgressState, result: &Result<TrackOutcome, TrackFailure>) {
    match result {
        Ok(_) => progress.mark_completed(),
        Err(failure) => {
            log::debug!("{}", failure);
            progress.mark_failed();
        }
    }
}
