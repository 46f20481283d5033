use std::fmt;
use std::path::PathBuf;

use url::Url;

use super::TrackError;

/// One album as listed on the catalog's search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumCandidate {
    pub title: String,
    /// Href of the album page, usually relative to the catalog root.
    pub source_path: String,
}

/// Address of a track's intermediate download page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLink(Url);

impl TrackLink {
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    pub fn url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for TrackLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Which asset link to pick on a track's download page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AudioFormat {
    #[default]
    Mp3,
    /// Second asset link when the page offers one, first otherwise.
    Flac,
}

/// Step a track task is in; a failure records the step it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackPhase {
    Fetching,
    LocatingAsset,
    Streaming,
    Finalizing,
    Done,
}

impl fmt::Display for TrackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackPhase::Fetching => "fetching",
            TrackPhase::LocatingAsset => "locating asset",
            TrackPhase::Streaming => "streaming",
            TrackPhase::Finalizing => "finalizing",
            TrackPhase::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Final location of the downloaded file.
    Saved(PathBuf),
    /// The download page had no asset link; nothing was written.
    NoAsset(TrackLink),
}

#[derive(Debug, Clone)]
pub struct TrackFailure {
    pub index: usize,
    pub link: TrackLink,
    pub phase: TrackPhase,
    pub error: TrackError,
}

impl fmt::Display for TrackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "track #{} ({}) failed while {}: {}",
            self.index, self.link, self.phase, self.error
        )
    }
}

/// Per-run tally of what every track task ended up doing.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub saved: Vec<PathBuf>,
    pub skipped: Vec<TrackLink>,
    pub failed: Vec<TrackFailure>,
    /// Tasks that panicked or were cancelled before reporting back.
    pub aborted: usize,
}

impl RunSummary {
    pub fn record(&mut self, result: Result<TrackOutcome, TrackFailure>) {
        match result {
            Ok(TrackOutcome::Saved(path)) => self.saved.push(path),
            Ok(TrackOutcome::NoAsset(link)) => self.skipped.push(link),
            Err(failure) => self.failed.push(failure),
        }
    }

    pub fn total(&self) -> usize {
        self.saved.len() + self.skipped.len() + self.failed.len() + self.aborted
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len() + self.aborted
    }

    pub fn is_complete(&self) -> bool {
        self.failure_count() == 0
    }
}
