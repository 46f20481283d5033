use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use super::progress::ProgressState;
use crate::api::client::{Result, TRACK_ROW_SELECTOR};
use crate::api::{Anchor, Document};
use crate::domain::TrackLink;

/// Track download pages listed on an album page.
pub struct LinkExtractor {
    base: Url,
    rows: Vec<Anchor>,
}

impl LinkExtractor {
    pub fn from_document(doc: &Document) -> Result<Self> {
        Ok(Self {
            base: doc.url().clone(),
            rows: doc.anchors(TRACK_ROW_SELECTOR)?,
        })
    }

    /// Links in document order. Rows without a usable href are skipped.
    pub fn links(&self) -> impl Iterator<Item = TrackLink> + '_ {
        self.rows
            .iter()
            .filter_map(|row| row.href.as_deref())
            .filter_map(|href| self.base.join(href).ok())
            .map(TrackLink::new)
    }

    /// Feed every link into `queue`, counting each one in `progress` first.
    ///
    /// The queue is closed when the task ends. Resolves to the number of
    /// links handed over.
    pub fn spawn(
        self,
        queue: mpsc::Sender<TrackLink>,
        progress: Arc<ProgressState>,
    ) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut emitted = 0;

            for link in self.links() {
                let Ok(slot) = queue.reserve().await else {
                    log::debug!("link queue closed after {} tracks", emitted);
                    break;
                };
                progress.add_total();
                slot.send(link);
                emitted += 1;
            }

            log::debug!("found {} tracks", emitted);
            emitted
        })
    }
}
