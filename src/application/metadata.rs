use std::path::Path;

use lofty::{Accessor, Probe, TaggedFileExt};

/// Reads the embedded title of a downloaded audio file.
///
/// Called from a blocking thread.
pub trait TagReader: Send + Sync {
    /// `Ok(None)` when the file has tags but no title.
    fn read_title(&self, path: &Path) -> Result<Option<String>, String>;
}

/// Tag reader backed by `lofty`; the container is detected from content.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_title(&self, path: &Path) -> Result<Option<String>, String> {
        let tagged_file = Probe::open(path)
            .map_err(|e| e.to_string())?
            .guess_file_type()
            .map_err(|e| e.to_string())?
            .read()
            .map_err(|e| e.to_string())?;

        let title = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .and_then(|tag| tag.title().map(|title| title.trim().to_string()))
            .filter(|title| !title.is_empty());

        Ok(title)
    }
}
