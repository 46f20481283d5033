use std::path::PathBuf;
use std::sync::Arc;

use indicatif::ProgressDrawTarget;

use crate::api::{ApiConfig, CatalogClient};
use crate::application::progress::progress_bar;
use crate::application::{download_album, LoftyTagReader, PipelineConfig, TagReader};
use crate::domain::{AlbumCandidate, AppError, AudioFormat, RunSummary};
use crate::utils::sanitize_filename;

/// Run-wide options taken from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub jobs: usize,
    pub format: AudioFormat,
}

/// A finished album download.
#[derive(Debug)]
pub struct Download {
    pub album_dir: PathBuf,
    pub summary: RunSummary,
}

pub struct App {
    client: CatalogClient,
    settings: Settings,
    tags: Arc<dyn TagReader>,
}

impl App {
    pub fn new(api: ApiConfig, settings: Settings) -> Result<Self, AppError> {
        let client = CatalogClient::new(api).map_err(|e| AppError::Api(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            tags: Arc::new(LoftyTagReader),
        })
    }

    pub async fn search(&self, title: &str) -> Result<Vec<AlbumCandidate>, AppError> {
        let albums = self
            .client
            .search_albums(title)
            .await
            .map_err(|e| AppError::Api(e.to_string()))?;

        if albums.is_empty() {
            return Err(AppError::NoResults(title.to_string()));
        }

        log::debug!("{} albums match \"{}\"", albums.len(), title);
        Ok(albums)
    }

    /// `<output_dir>/<album title>`, created if missing.
    pub async fn prepare_album_dir(&self, album: &AlbumCandidate) -> Result<PathBuf, AppError> {
        let name = sanitize_filename(&album.title);
        if name.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "album title \"{}\" cannot be used as a directory name",
                album.title
            )));
        }

        let dir = self.settings.output_dir.join(name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Io(format!("Failed to create {}: {}", dir.display(), e)))?;

        Ok(dir)
    }

    /// Fetch the album page and download all of its tracks, drawing progress
    /// to `target`.
    pub async fn download(
        &self,
        album: &AlbumCandidate,
        target: ProgressDrawTarget,
    ) -> Result<Download, AppError> {
        let album_dir = self.prepare_album_dir(album).await?;

        let url = self
            .client
            .album_url(album)
            .map_err(|e| AppError::Api(e.to_string()))?;
        log::info!("downloading \"{}\" from {}", album.title, url);

        let doc = self
            .client
            .get_document(&url)
            .await
            .map_err(|e| AppError::Api(e.to_string()))?;

        let config = PipelineConfig {
            jobs: self.settings.jobs,
            format: self.settings.format,
            ..PipelineConfig::new(&album_dir)
        };

        let bar = progress_bar(target);
        let summary =
            download_album(self.client.clone(), self.tags.clone(), &doc, config, bar).await?;

        Ok(Download { album_dir, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::DEFAULT_JOBS;

    const SEARCH_PAGE: &str = r#"<div id="EchoTopic">
        <p><a href="/game-soundtracks/album/secret">Secret of Mana</a></p>
    </div>"#;

    fn app(base: &str, output_dir: &std::path::Path) -> App {
        let settings = Settings {
            output_dir: output_dir.to_path_buf(),
            jobs: DEFAULT_JOBS,
            format: AudioFormat::Mp3,
        };
        App::new(ApiConfig::with_base_url(base), settings).unwrap()
    }

    #[tokio::test]
    async fn test_search_without_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("<div id=\"EchoTopic\"><p>No results</p></div>")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let result = app(&server.url(), dir.path()).search("nothing").await;
        assert!(matches!(result, Err(AppError::NoResults(ref t)) if t == "nothing"));
    }

    #[tokio::test]
    async fn test_album_with_unusable_title() {
        let dir = tempfile::tempdir().unwrap();
        let album = AlbumCandidate {
            title: " ... ".to_string(),
            source_path: "/x".to_string(),
        };

        let result = app("http://127.0.0.1:9", dir.path())
            .prepare_album_dir(&album)
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_search_then_download() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(SEARCH_PAGE)
            .create_async()
            .await;
        server
            .mock("GET", "/game-soundtracks/album/secret")
            .with_status(200)
            .with_body(crate::application::test_helpers::album_page(&[Some(
                "/game-soundtracks/album/secret/01.mp3",
            )]))
            .create_async()
            .await;
        server
            .mock("GET", "/game-soundtracks/album/secret/01.mp3")
            .with_status(404)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let app = app(&server.url(), dir.path());
        let albums = app.search("secret of mana").await.unwrap();
        let download = app.download(&albums[0], ProgressDrawTarget::hidden()).await.unwrap();

        assert_eq!(download.album_dir, dir.path().join("Secret of Mana"));
        assert!(download.album_dir.is_dir());
        assert_eq!(download.summary.failed.len(), 1);
    }
}
