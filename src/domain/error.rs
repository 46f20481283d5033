use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a run before or outside of the track downloads.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No albums found for \"{0}\"")]
    NoResults(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors that fail a single track and nothing else.
#[derive(Debug, Clone, Error)]
pub enum TrackError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unreadable page: {0}")]
    Document(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("cannot read metadata of {}: {reason}", path.display())]
    Metadata { path: PathBuf, reason: String },
}
