use scraper::{Html, Selector};
use url::Url;

use super::client::{ApiError, Result};

/// A fetched HTML page together with the URL it was served from.
///
/// The markup is kept as text and parsed on every query, so a `Document`
/// can be moved between tasks freely.
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    html: String,
}

/// Link element matched by a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: Option<String>,
    pub text: String,
}

impl Document {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All elements matching `selector`, in document order.
    pub fn anchors(&self, selector: &str) -> Result<Vec<Anchor>> {
        let selector = Selector::parse(selector)
            .map_err(|e| ApiError::InvalidSelector(format!("{}: {}", selector, e)))?;

        let html = Html::parse_document(&self.html);
        let anchors = html
            .select(&selector)
            .map(|element| Anchor {
                href: element.value().attr("href").map(str::to_string),
                text: element.text().collect::<String>().trim().to_string(),
            })
            .collect();

        Ok(anchors)
    }

    /// Resolve an href found in this document to an absolute URL.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.url.join(href).ok()
    }
}
