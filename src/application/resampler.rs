// Gap-aware resampler - irregular raw samples onto a regular coarse grid
use crate::domain::telemetry::{TimeSeriesPoint, MS_PER_HOUR, MS_PER_MINUTE};
use crate::infrastructure::config::ResampleConfig;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ResampleError {
    #[error("resample intervals must be positive (fine {fine_minutes} min, coarse {coarse_hours} h)")]
    ZeroInterval { fine_minutes: u32, coarse_hours: u32 },

    #[error("coarse interval of {coarse_hours} h is not a multiple of the {fine_minutes} min fine interval")]
    MisalignedInterval { fine_minutes: u32, coarse_hours: u32 },
}

/// Two-step resampler: upsample to a fine grid, bridging only short interior
/// gaps, then pick the values that sit exactly on the coarse grid.
///
/// Gaps wider than `max_fill_gap` fine steps stay empty all the way through,
/// so they show up as holes in the coarse output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapAwareResampler {
    fine_ms: i64,
    coarse_ms: i64,
    max_fill_gap: i64,
}

impl GapAwareResampler {
    pub fn new(config: &ResampleConfig) -> Result<Self, ResampleError> {
        let fine_minutes = config.fine_interval_minutes;
        let coarse_hours = config.coarse_interval_hours;
        if fine_minutes == 0 || coarse_hours == 0 {
            return Err(ResampleError::ZeroInterval {
                fine_minutes,
                coarse_hours,
            });
        }

        let fine_ms = i64::from(fine_minutes) * MS_PER_MINUTE;
        let coarse_ms = i64::from(coarse_hours) * MS_PER_HOUR;
        if coarse_ms % fine_ms != 0 {
            return Err(ResampleError::MisalignedInterval {
                fine_minutes,
                coarse_hours,
            });
        }

        Ok(Self {
            fine_ms,
            coarse_ms,
            max_fill_gap: i64::from(config.max_fill_gap),
        })
    }

    pub fn coarse_interval_ms(&self) -> i64 {
        self.coarse_ms
    }

    /// Raw series in, coarse series out: unique, strictly increasing,
    /// coarse-aligned timestamps with unfillable hours left out.
    pub fn resample(&self, series: Vec<TimeSeriesPoint>) -> Vec<TimeSeriesPoint> {
        let observed = dedup_by_timestamp(series);
        let fine = self.upsample(&observed);
        self.downsample(fine)
    }

    /// Fine-grid series over the observed span of `observed` (which must be
    /// sorted by time with unique timestamps).
    pub fn upsample(&self, observed: &[TimeSeriesPoint]) -> Vec<TimeSeriesPoint> {
        let mut fine = Vec::new();

        for pair in observed.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if self.on_grid(a.time_ms) {
                fine.push(a);
            }

            let (Some(first), Some(last)) = (
                self.next_grid_after(a.time_ms),
                self.prev_grid_before(b.time_ms),
            ) else {
                continue;
            };
            if last < first {
                continue;
            }

            let Some(gap) = last.checked_sub(first).map(|d| d / self.fine_ms + 1) else {
                continue;
            };
            if gap > self.max_fill_gap {
                continue;
            }

            let span = b.time_ms as f64 - a.time_ms as f64;
            for step in 0..gap {
                let t = first + step * self.fine_ms;
                let fraction = (t as f64 - a.time_ms as f64) / span;
                fine.push(TimeSeriesPoint::new(t, a.value + (b.value - a.value) * fraction));
            }
        }

        if let Some(&last) = observed.last() {
            if self.on_grid(last.time_ms) {
                fine.push(last);
            }
        }

        fine
    }

    /// Keep only the fine points landing exactly on a coarse boundary.
    pub fn downsample(&self, fine: Vec<TimeSeriesPoint>) -> Vec<TimeSeriesPoint> {
        fine.into_iter()
            .filter(|p| p.time_ms.rem_euclid(self.coarse_ms) == 0)
            .collect()
    }

    fn on_grid(&self, time_ms: i64) -> bool {
        time_ms.rem_euclid(self.fine_ms) == 0
    }

    fn next_grid_after(&self, time_ms: i64) -> Option<i64> {
        time_ms
            .div_euclid(self.fine_ms)
            .checked_add(1)?
            .checked_mul(self.fine_ms)
    }

    fn prev_grid_before(&self, time_ms: i64) -> Option<i64> {
        let floor = time_ms.div_euclid(self.fine_ms).checked_mul(self.fine_ms)?;
        if floor == time_ms {
            floor.checked_sub(self.fine_ms)
        } else {
            Some(floor)
        }
    }
}

/// Drop repeated timestamps, keeping the first in input order, then sort by time.
pub fn dedup_by_timestamp(series: Vec<TimeSeriesPoint>) -> Vec<TimeSeriesPoint> {
    let mut seen = HashSet::with_capacity(series.len());
    let mut unique: Vec<TimeSeriesPoint> = series
        .into_iter()
        .filter(|p| seen.insert(p.time_ms))
        .collect();
    unique.sort_by_key(|p| p.time_ms);
    unique
}
