pub mod error;
pub mod model;

pub use error::{AppError, TrackError};
pub use model::{
    AlbumCandidate, AudioFormat, RunSummary, TrackFailure, TrackLink, TrackOutcome, TrackPhase,
};
