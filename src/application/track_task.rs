use std::io::ErrorKind;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use url::Url;

use super::metadata::TagReader;
use super::names::NameRegistry;
use crate::api::client::ASSET_LINK_SELECTOR;
use crate::api::{ApiError, CatalogClient, Document};
use crate::domain::{AudioFormat, TrackError, TrackFailure, TrackLink, TrackOutcome, TrackPhase};
use crate::utils::{extension_from_url, sanitize_filename, DEFAULT_EXTENSION};

/// Everything a track task needs besides its own link and index.
pub struct TrackContext {
    pub client: CatalogClient,
    pub tags: Arc<dyn TagReader>,
    pub album_dir: PathBuf,
    pub format: AudioFormat,
    pub names: NameRegistry,
}

impl TrackContext {
    pub fn new(
        client: CatalogClient,
        tags: Arc<dyn TagReader>,
        album_dir: impl Into<PathBuf>,
        format: AudioFormat,
    ) -> Self {
        Self {
            client,
            tags,
            album_dir: album_dir.into(),
            format,
            names: NameRegistry::default(),
        }
    }
}

/// Downloads one track: page, asset, file, rename.
pub struct TrackRetrievalTask {
    ctx: Arc<TrackContext>,
    index: usize,
    link: TrackLink,
}

enum TaskState {
    Fetching,
    LocatingAsset(Document),
    Streaming(Url),
    Finalizing(PathBuf),
}

impl TaskState {
    fn phase(&self) -> TrackPhase {
        match self {
            TaskState::Fetching => TrackPhase::Fetching,
            TaskState::LocatingAsset(_) => TrackPhase::LocatingAsset,
            TaskState::Streaming(_) => TrackPhase::Streaming,
            TaskState::Finalizing(_) => TrackPhase::Finalizing,
        }
    }
}

impl TrackRetrievalTask {
    pub fn new(ctx: Arc<TrackContext>, index: usize, link: TrackLink) -> Self {
        Self { ctx, index, link }
    }

    pub async fn run(self) -> Result<TrackOutcome, TrackFailure> {
        let mut state = TaskState::Fetching;

        loop {
            let phase = state.phase();
            log::trace!("track #{} {}", self.index, phase);

            state = match self.step(state).await {
                Ok(ControlFlow::Continue(next)) => next,
                Ok(ControlFlow::Break(outcome)) => {
                    log::debug!("track #{} {}", self.index, TrackPhase::Done);
                    return Ok(outcome);
                }
                Err(error) => return Err(self.failure(phase, error)),
            };
        }
    }

    async fn step(
        &self,
        state: TaskState,
    ) -> Result<ControlFlow<TrackOutcome, TaskState>, TrackError> {
        match state {
            TaskState::Fetching => {
                let doc = self
                    .ctx
                    .client
                    .get_document(self.link.url())
                    .await
                    .map_err(track_error)?;
                Ok(ControlFlow::Continue(TaskState::LocatingAsset(doc)))
            }
            TaskState::LocatingAsset(doc) => {
                let marker = &self.ctx.client.config().asset_host_marker;
                match find_asset_url(&doc, marker, self.ctx.format).map_err(track_error)? {
                    Some(url) => Ok(ControlFlow::Continue(TaskState::Streaming(url))),
                    None => {
                        log::debug!("track #{}: no asset link on {}", self.index, self.link);
                        Ok(ControlFlow::Break(TrackOutcome::NoAsset(self.link.clone())))
                    }
                }
            }
            TaskState::Streaming(url) => {
                let path = self.staging_path(&url);
                self.stream_to(&url, &path).await?;
                Ok(ControlFlow::Continue(TaskState::Finalizing(path)))
            }
            TaskState::Finalizing(path) => {
                let path = self.finalize(path).await?;
                Ok(ControlFlow::Break(TrackOutcome::Saved(path)))
            }
        }
    }

    /// `<album_dir>/<index>.<ext>`
    fn staging_path(&self, asset: &Url) -> PathBuf {
        let ext = extension_from_url(asset).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        self.ctx.album_dir.join(format!("{}.{}", self.index, ext))
    }

    /// Existing files are never opened; a failed download removes its own file.
    async fn stream_to(&self, url: &Url, path: &Path) -> Result<(), TrackError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| TrackError::Io(format!("Failed to create {}: {}", path.display(), e)))?;

        let result = self.write_asset(url, file, path).await;

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != ErrorKind::NotFound {
                    log::warn!("could not remove partial file {}: {}", path.display(), e);
                }
            }
        }

        result
    }

    async fn write_asset(&self, url: &Url, mut file: File, path: &Path) -> Result<(), TrackError> {
        let mut stream = Box::pin(
            self.ctx
                .client
                .download_file_stream(url)
                .await
                .map_err(track_error)?,
        );

        let mut downloaded: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(track_error)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TrackError::Io(format!("Write error: {}", e)))?;
            downloaded += chunk.len() as u64;
        }

        file.sync_all()
            .await
            .map_err(|e| TrackError::Io(format!("Failed to sync file: {}", e)))?;

        log::trace!(
            "track #{}: wrote {} bytes to {}",
            self.index,
            downloaded,
            path.display()
        );
        Ok(())
    }

    /// Rename the file after its embedded title.
    ///
    /// Any metadata problem leaves the file under its sequential name.
    async fn finalize(&self, path: PathBuf) -> Result<PathBuf, TrackError> {
        let tags = self.ctx.tags.clone();
        let probe = path.clone();
        let title = tokio::task::spawn_blocking(move || tags.read_title(&probe))
            .await
            .map_err(|e| metadata_error(&path, e.to_string()))?
            .map_err(|reason| metadata_error(&path, reason))?
            .ok_or_else(|| metadata_error(&path, "no title tag"))?;

        let name = sanitize_filename(&title);
        if name.is_empty() {
            return Err(metadata_error(&path, "title is empty"));
        }

        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(DEFAULT_EXTENSION);
        self.ctx.names.place(&path, &name, ext, self.index).await
    }

    fn failure(&self, phase: TrackPhase, error: TrackError) -> TrackFailure {
        TrackFailure {
            index: self.index,
            link: self.link.clone(),
            phase,
            error,
        }
    }
}

/// First asset link for MP3, the second one (when present) for FLAC.
pub fn find_asset_url(
    doc: &Document,
    marker: &str,
    format: AudioFormat,
) -> crate::api::Result<Option<Url>> {
    let assets: Vec<String> = doc
        .anchors(ASSET_LINK_SELECTOR)?
        .into_iter()
        .filter_map(|anchor| anchor.href)
        .filter(|href| href.contains(marker))
        .collect();

    let chosen = match format {
        AudioFormat::Mp3 => assets.first(),
        AudioFormat::Flac => assets.get(1).or_else(|| assets.first()),
    };

    Ok(chosen.and_then(|href| doc.resolve(href)))
}

fn track_error(e: ApiError) -> TrackError {
    match e {
        ApiError::RequestError(_) | ApiError::Status(_) => TrackError::Transport(e.to_string()),
        ApiError::InvalidUrl(_) | ApiError::InvalidSelector(_) => {
            TrackError::Document(e.to_string())
        }
    }
}

fn metadata_error(path: &Path, reason: impl Into<String>) -> TrackError {
    TrackError::Metadata {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
