//! The album download pipeline.
//!
//! - [`link_extractor`] - track links from an album page onto the handoff queue
//! - [`scheduler`] - one task per link, joined into a [`RunSummary`](crate::domain::RunSummary)
//! - [`track_task`] - page, asset, file and rename for a single track
//! - [`progress`] - shared counters and the progress line that shows them
//! - [`metadata`] - embedded title lookup used when finalizing a file
//! - [`names`] - final file names, stable across finish orders
//! - [`pipeline`] - wires the pieces together for one album

pub mod link_extractor;
pub mod metadata;
pub mod names;
pub mod pipeline;
pub mod progress;
pub mod scheduler;
pub mod track_task;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use metadata::{LoftyTagReader, TagReader};
pub use pipeline::{download_album, PipelineConfig, DEFAULT_JOBS};
