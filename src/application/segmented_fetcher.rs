// Segmented fetcher - downloads a date range piece by piece into the cache
use crate::application::retriever::{RetrievalError, Retriever};
use crate::domain::station::{DateRange, StationRow};
use crate::infrastructure::append_only_cache::{AppendOnlyCache, CacheError, MergeOutcome};
use crate::infrastructure::config::{BackoffKind, FetchConfig};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("segment size must be at least one day")]
    InvalidSegmentSize,

    #[error("retrieval failed for {segment}: {source}")]
    Retrieval {
        segment: DateRange,
        #[source]
        source: RetrievalError,
    },

    #[error("no data for {segment} after {attempts} attempts")]
    RetriesExhausted { segment: DateRange, attempts: u32 },

    #[error("cache update failed for {segment}: {source}")]
    Cache {
        segment: DateRange,
        #[source]
        source: CacheError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed(Duration),
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay to wait after the `failures`-th empty result (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(failures.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// How often, and how patiently, an empty segment is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Retry immediately, forever.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::None,
        }
    }

    /// Give up after `max_attempts` empty results. The first attempt is
    /// always made, so `0` behaves like `1`.
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff: Backoff::None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        let backoff = match config.backoff {
            BackoffKind::None => Backoff::None,
            BackoffKind::Fixed => Backoff::Fixed(Duration::from_millis(config.backoff_ms)),
            BackoffKind::Exponential => Backoff::Exponential {
                initial: Duration::from_millis(config.backoff_ms),
                max: Duration::from_millis(config.max_backoff_ms),
            },
        };

        let policy = match config.max_attempts {
            Some(max) => Self::bounded(max.get()),
            None => Self::unbounded(),
        };
        policy.with_backoff(backoff)
    }

    fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// What happened to one segment of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub segment: DateRange,
    pub attempts: u32,
    pub rows: usize,
    pub merge: MergeOutcome,
}

pub struct SegmentedFetcher {
    retriever: Arc<dyn Retriever>,
    cache: AppendOnlyCache,
    max_segment_days: u64,
    policy: RetryPolicy,
}

impl SegmentedFetcher {
    pub fn new(retriever: Arc<dyn Retriever>, cache: AppendOnlyCache, config: &FetchConfig) -> Self {
        Self {
            retriever,
            cache,
            max_segment_days: config.max_segment_days,
            policy: RetryPolicy::from_config(config),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cache(&self) -> &AppendOnlyCache {
        &self.cache
    }

    /// Download `range` segment by segment, in chronological order, merging
    /// each one into the cache before the next starts.
    ///
    /// A retrieval error aborts the whole range; segments already merged
    /// stay in the cache.
    pub async fn fetch_range(&self, range: DateRange) -> Result<Vec<FetchOutcome>, FetchError> {
        if self.max_segment_days == 0 {
            return Err(FetchError::InvalidSegmentSize);
        }

        let segments = range.segments(self.max_segment_days);
        tracing::info!(
            "Downloading weather station data for {} in {} segment(s)",
            range,
            segments.len()
        );

        let mut outcomes = Vec::with_capacity(segments.len());
        for segment in segments {
            tracing::info!("Getting data for {}", segment);
            let (attempts, rows) = self.fetch_segment(&segment).await?;

            let merge = self
                .cache
                .merge_segment(&segment)
                .map_err(|source| FetchError::Cache { segment, source })?;
            tracing::info!(
                "Done with {}: {} rows after {} attempt(s), cache {:?}",
                segment,
                rows.len(),
                attempts,
                merge
            );

            outcomes.push(FetchOutcome {
                segment,
                attempts,
                rows: rows.len(),
                merge,
            });
        }

        Ok(outcomes)
    }

    async fn fetch_segment(&self, segment: &DateRange) -> Result<(u32, Vec<StationRow>), FetchError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let rows = self
                .retriever
                .fetch(segment)
                .await
                .map_err(|source| {
                    tracing::error!("Retrieval for {} failed: {}", segment, source);
                    FetchError::Retrieval {
                        segment: *segment,
                        source,
                    }
                })?;

            if !rows.is_empty() {
                return Ok((attempts, rows));
            }

            if !self.policy.allows(attempts) {
                return Err(FetchError::RetriesExhausted {
                    segment: *segment,
                    attempts,
                });
            }

            let delay = self.policy.backoff.delay(attempts);
            tracing::info!(
                "No data returned for {} (attempt {}), trying again",
                segment,
                attempts
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
