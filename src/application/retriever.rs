// Retriever trait for remote weather-station data access
use crate::domain::station::{DateRange, StationRow};
use crate::infrastructure::station_csv::StationCsvError;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Unrecoverable retrieval failures. An empty result is not one of these:
/// it comes back as `Ok` with no rows and the caller decides whether to retry.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retrieval command failed to start: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("retrieval command exited with {status}: {output}")]
    CommandFailed { status: String, output: String },

    #[error("retrieval timed out after {0}s")]
    Timeout(u64),

    #[error("request to station API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("station API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("segment artifact for {segment} was not produced at {path}")]
    MissingArtifact { segment: DateRange, path: PathBuf },

    #[error("could not read segment artifact: {0}")]
    Artifact(#[from] StationCsvError),
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch all station rows for one segment.
    ///
    /// Must be safe to call repeatedly for the same range.
    async fn fetch(&self, segment: &DateRange) -> Result<Vec<StationRow>, RetrievalError>;
}
