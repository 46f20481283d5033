use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::link_extractor::LinkExtractor;
use super::metadata::TagReader;
use super::progress::{ProgressReporter, ProgressState, DEFAULT_TICK};
use super::scheduler::DownloadScheduler;
use super::track_task::TrackContext;
use crate::api::{CatalogClient, Document};
use crate::domain::{AppError, AudioFormat, RunSummary};

/// Links waiting for the scheduler.
const LINK_QUEUE_CAPACITY: usize = 100;

pub const DEFAULT_JOBS: usize = 8;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory the album's tracks are written to; must already exist.
    pub album_dir: PathBuf,
    pub jobs: usize,
    pub format: AudioFormat,
    pub tick: Duration,
}

impl PipelineConfig {
    pub fn new(album_dir: impl Into<PathBuf>) -> Self {
        Self {
            album_dir: album_dir.into(),
            jobs: DEFAULT_JOBS,
            format: AudioFormat::default(),
            tick: DEFAULT_TICK,
        }
    }
}

/// Download every track listed on `album` into `config.album_dir`.
///
/// Progress is shown on `bar` while the tracks download. Individual track
/// failures end up in the summary; only an unreadable album page is an error.
pub async fn download_album(
    client: CatalogClient,
    tags: Arc<dyn TagReader>,
    album: &Document,
    config: PipelineConfig,
    bar: ProgressBar,
) -> Result<RunSummary, AppError> {
    let extractor =
        LinkExtractor::from_document(album).map_err(|e| AppError::Api(e.to_string()))?;

    let progress = Arc::new(ProgressState::default());
    let (tx, rx) = mpsc::channel(LINK_QUEUE_CAPACITY);
    let producer = extractor.spawn(tx, progress.clone());

    let stop = CancellationToken::new();
    let reporter = ProgressReporter::new(progress.clone(), config.tick, bar).spawn(stop.clone());

    let ctx = TrackContext::new(client, tags, config.album_dir, config.format);
    let summary = DownloadScheduler::new(ctx, config.jobs)
        .run(rx, progress.clone())
        .await;

    if let Err(e) = producer.await {
        log::error!("link extraction aborted: {}", e);
    }

    stop.cancel();
    reporter
        .await
        .map_err(|e| AppError::Io(format!("progress reporter failed: {}", e)))?;

    let snapshot = progress.snapshot();
    log::debug!(
        "{} of {} tracks completed, {} failed",
        snapshot.completed,
        snapshot.total,
        snapshot.failed
    );

    Ok(summary)
}
