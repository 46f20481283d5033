//! Shared download counters and the progress line that renders them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Counters written by the track tasks and read by the reporter.
///
/// `total` is bumped before a link is handed to the scheduler, so a track
/// can only complete after it has been counted.
#[derive(Debug, Default)]
pub struct ProgressState {
    completed: AtomicUsize,
    total: AtomicUsize,
    failed: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub failed: usize,
}

impl ProgressState {
    pub fn add_total(&self) {
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn mark_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn mark_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        // completed first: any completion it sees was counted in total already
        let completed = self.completed.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        let total = self.total.load(Ordering::SeqCst);

        ProgressSnapshot {
            completed,
            total,
            failed,
        }
    }
}

/// Spinner glyph plus counter, e.g. `| Completed... (2 / 7)`.
const TEMPLATE: &str = "{spinner} Completed... ({pos} / {len})";
/// Spinner frames; the last one is shown once the bar is finished.
const TICK_CHARS: &str = "|/-\\ ";

/// The progress line, drawn to `target`.
pub fn progress_bar(target: ProgressDrawTarget) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(0), target);
    match ProgressStyle::with_template(TEMPLATE) {
        Ok(style) => bar.set_style(style.tick_chars(TICK_CHARS)),
        Err(e) => log::debug!("unusable progress template: {}", e),
    }
    bar
}

pub struct ProgressReporter {
    state: Arc<ProgressState>,
    tick: Duration,
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(state: Arc<ProgressState>, tick: Duration, bar: ProgressBar) -> Self {
        Self { state, tick, bar }
    }

    /// Start redrawing `bar` until `stop` is cancelled.
    ///
    /// The handle resolves once the bar shows its final `total / total`.
    pub fn spawn(self, stop: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(stop))
    }

    async fn run(self, stop: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = stop.cancelled() => break,

                _ = ticker.tick() => {
                    let snapshot = self.state.snapshot();
                    self.show(snapshot.completed, snapshot.total);
                    self.bar.tick();
                }
            }
        }

        // everything that was counted is settled
        let total = self.state.snapshot().total;
        self.show(total, total);
        self.bar.finish();
        log::trace!("progress reporter stopped at {} tracks", total);
    }

    fn show(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_template() {
        let style = ProgressStyle::with_template(TEMPLATE);
        assert!(style.is_ok());
        assert_eq!(TICK_CHARS.chars().count(), 5);
    }

    #[test]
    fn test_snapshot_never_exceeds_total() {
        let state = ProgressState::default();
        for _ in 0..3 {
            state.add_total();
        }
        state.mark_completed();
        state.mark_failed();

        let snapshot = state.snapshot();
        assert_eq!(
            snapshot,
            ProgressSnapshot {
                completed: 1,
                total: 3,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_reporter_final_frame_forces_total() {
        let state = Arc::new(ProgressState::default());
        for _ in 0..3 {
            state.add_total();
        }
        state.mark_completed();

        let bar = progress_bar(ProgressDrawTarget::hidden());
        let stop = CancellationToken::new();
        let reporter = ProgressReporter::new(state.clone(), Duration::from_millis(5), bar.clone())
            .spawn(stop.clone());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(bar.position(), 1);
        assert_eq!(bar.length(), Some(3));
        assert!(!bar.is_finished());

        stop.cancel();
        reporter.await.unwrap();

        assert_eq!(bar.position(), 3);
        assert_eq!(bar.length(), Some(3));
        assert!(bar.is_finished());
    }

    #[tokio::test]
    async fn test_reporter_stops_on_empty_album() {
        let stop = CancellationToken::new();
        stop.cancel();

        let bar = progress_bar(ProgressDrawTarget::hidden());
        let reporter =
            ProgressReporter::new(Arc::new(ProgressState::default()), DEFAULT_TICK, bar.clone())
                .spawn(stop);

        tokio::time::timeout(Duration::from_secs(1), reporter)
            .await
            .expect("reporter did not stop")
            .unwrap();
        assert_eq!(bar.position(), 0);
        assert_eq!(bar.length(), Some(0));
        assert!(bar.is_finished());
    }

    #[tokio::test]
    async fn test_concurrent_writers_keep_bound() {
        let state = Arc::new(ProgressState::default());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                state.add_total();
                tokio::task::yield_now().await;
                state.mark_completed();
            }));
        }

        for _ in 0..64 {
            let snapshot = state.snapshot();
            assert!(snapshot.completed <= snapshot.total);
            tokio::task::yield_now().await;
        }

        for handle in handles {
            handle.await.unwrap();
        }
        let snapshot = state.snapshot();
        assert_eq!(snapshot.completed, 16);
        assert_eq!(snapshot.total, 16);
    }
}
