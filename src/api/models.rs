/// Configuration for the catalog client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Root of the catalog; search, album and track hrefs resolve against it.
    pub base_url: String,
    /// Substring identifying audio asset links on a track's download page.
    pub asset_host_marker: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://downloads.khinsider.com".to_string(),
            asset_host_marker: "vgmsite".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
