// Append-only CSV cache of downloaded weather-station rows
use crate::domain::station::{DateRange, StationRow};
use crate::infrastructure::config::CacheConfig;
use crate::infrastructure::station_csv::{
    artifact_path, read_station_rows, write_station_rows, StationCsvError, TIMESTAMP_COLUMN,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file error: {0}")]
    Csv(#[from] StationCsvError),

    #[error("cache {path} has columns {found:?}, expected {expected:?}")]
    ColumnMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("row with {found} values does not fit the {expected} cache columns")]
    RowWidth { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No cache existed; it now holds `rows` rows.
    Created { rows: usize },
    /// `added` new distinct rows; the cache now holds `total`.
    Merged { added: usize, total: usize },
    /// The segment artifact was not on disk; the cache was left alone.
    ArtifactMissing,
}

/// Durable store that only grows through de-duplicating merges.
///
/// Rows are deduplicated on their full content only. Two rows for the same
/// timestamp with different values are both kept.
#[derive(Debug, Clone)]
pub struct AppendOnlyCache {
    path: PathBuf,
    columns: Vec<String>,
    artifact_dir: PathBuf,
}

impl AppendOnlyCache {
    pub fn new(config: &CacheConfig, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: config.path.clone(),
            columns: config.columns.clone(),
            artifact_dir: artifact_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn artifact_path(&self, segment: &DateRange) -> PathBuf {
        artifact_path(&self.artifact_dir, segment)
    }

    /// All cached rows in stored order; empty when no cache exists yet.
    pub fn load(&self) -> Result<Vec<StationRow>, CacheError> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }

        let (header, rows) = read_station_rows(&self.path, self.columns.len())?;
        let expected: Vec<String> = std::iter::once(TIMESTAMP_COLUMN.to_string())
            .chain(self.columns.iter().cloned())
            .collect();
        if header != expected {
            return Err(CacheError::ColumnMismatch {
                path: self.path.clone(),
                expected,
                found: header,
            });
        }

        Ok(rows)
    }

    /// Merge `rows` into the store: existing rows first, then new ones, with
    /// exact duplicates collapsed onto their first occurrence.
    pub fn merge(&self, rows: &[StationRow]) -> Result<MergeOutcome, CacheError> {
        if let Some(row) = rows.iter().find(|r| r.values.len() != self.columns.len()) {
            return Err(CacheError::RowWidth {
                expected: self.columns.len(),
                found: row.values.len(),
            });
        }

        let existed = self.path.is_file();
        let existing = self.load()?;
        let before = existing.len();

        let mut seen = HashSet::new();
        let merged: Vec<StationRow> = existing
            .into_iter()
            .chain(rows.iter().cloned())
            .filter(|row| seen.insert(row.content_key()))
            .collect();

        write_station_rows(&self.path, &self.columns, &merged)?;

        let outcome = if existed {
            MergeOutcome::Merged {
                added: merged.len().saturating_sub(before),
                total: merged.len(),
            }
        } else {
            MergeOutcome::Created { rows: merged.len() }
        };

        tracing::debug!("Cache {} updated: {:?}", self.path.display(), outcome);
        Ok(outcome)
    }

    /// Merge the artifact the retrieval step left for `segment`.
    ///
    /// A missing artifact is not fatal: whatever is already cached stays usable.
    pub fn merge_segment(&self, segment: &DateRange) -> Result<MergeOutcome, CacheError> {
        let path = self.artifact_path(segment);
        if !path.is_file() {
            tracing::warn!(
                "Station data for {} does not exist at {}, skipping cache update",
                segment,
                path.display()
            );
            return Ok(MergeOutcome::ArtifactMissing);
        }

        let (_, rows) = read_station_rows(&path, self.columns.len())?;
        self.merge(&rows)
    }
}
