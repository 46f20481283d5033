use futures::Stream;
use futures::TryStreamExt;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::document::Document;
use super::models::ApiConfig;
use crate::domain::AlbumCandidate;

/// Album links on the search result page.
pub const ALBUM_RESULT_SELECTOR: &str = "#EchoTopic > p > a";
/// One link per track on an album page, pointing at its download page.
pub const TRACK_ROW_SELECTOR: &str = ".playlistDownloadSong > a";
/// Links on a track's download page; asset links are a subset of these.
pub const ASSET_LINK_SELECTOR: &str = "#EchoTopic > p > a";

const SEARCH_PATH: &str = "search";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server returned error: {0}")]
    Status(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct CatalogClient {
    config: ApiConfig,
    base_url: Url,
    http: Client,
}

impl CatalogClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;

        Ok(Self {
            config,
            base_url,
            http: Client::new(),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `<base>/search?search=<title>`, with spaces encoded as `+`.
    pub fn search_url(&self, title: &str) -> Result<Url> {
        let mut url = self.base_url.join(SEARCH_PATH)?;
        url.query_pairs_mut().append_pair("search", title.trim());
        Ok(url)
    }

    pub fn album_url(&self, album: &AlbumCandidate) -> Result<Url> {
        Ok(self.base_url.join(&album.source_path)?)
    }

    /// Fetch a page and keep its markup for later queries.
    pub async fn get_document(&self, url: &Url) -> Result<Document> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ApiError::Status(format!("Page request failed: {}", e)))?;

        let final_url = response.url().clone();
        let html = response.text().await?;

        Ok(Document::new(final_url, html))
    }

    /// Search the catalog and list the albums on the result page.
    pub async fn search_albums(&self, title: &str) -> Result<Vec<AlbumCandidate>> {
        let url = self.search_url(title)?;
        log::debug!("searching {}", url);

        let doc = self.get_document(&url).await?;
        album_candidates(&doc)
    }

    /// Body of an audio asset as a stream of chunks.
    pub async fn download_file_stream(
        &self,
        download_url: &Url,
    ) -> Result<impl Stream<Item = Result<bytes::Bytes>>> {
        let response = self
            .http
            .get(download_url.clone())
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ApiError::Status(format!("Download request failed: {}", e)))?;

        log::trace!(
            "{} answered with {:?} bytes",
            download_url,
            response.content_length()
        );
        Ok(response.bytes_stream().map_err(ApiError::RequestError))
    }
}

/// Albums listed on a search result page; entries without an href are dropped.
pub fn album_candidates(doc: &Document) -> Result<Vec<AlbumCandidate>> {
    let albums = doc
        .anchors(ALBUM_RESULT_SELECTOR)?
        .into_iter()
        .filter_map(|anchor| {
            anchor.href.map(|href| AlbumCandidate {
                title: anchor.text,
                source_path: href,
            })
        })
        .collect();

    Ok(albums)
}
