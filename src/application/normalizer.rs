// Series preparation - unit normalisation and deployment-edge trimming
use crate::domain::telemetry::TimeSeriesPoint;
use crate::infrastructure::config::{SeriesConfig, TrimConfig};

/// Maps a raw measurement onto its canonical unit.
pub trait UnitNormalizer: Send + Sync {
    fn normalize(&self, value: f64) -> f64;
}

pub struct Identity;

impl UnitNormalizer for Identity {
    fn normalize(&self, value: f64) -> f64 {
        value
    }
}

/// `value * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linear {
    pub scale: f64,
    pub offset: f64,
}

impl UnitNormalizer for Linear {
    fn normalize(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }
}

pub fn normalizer_for(series: &SeriesConfig) -> Box<dyn UnitNormalizer> {
    if series.scale == 1.0 && series.offset == 0.0 {
        Box::new(Identity)
    } else {
        Box::new(Linear {
            scale: series.scale,
            offset: series.offset,
        })
    }
}

pub fn normalize_series(
    points: Vec<TimeSeriesPoint>,
    normalizer: &dyn UnitNormalizer,
) -> Vec<TimeSeriesPoint> {
    points
        .into_iter()
        .map(|p| TimeSeriesPoint::new(p.time_ms, normalizer.normalize(p.value)))
        .collect()
}

/// Cut readings taken while a logger was out of the water at either end of
/// a deployment.
///
/// Within the first `window` samples the series starts at the last sample
/// that jumped by at least `max_step` from its predecessor; within the last
/// `window` samples it ends just before the earliest such jump.
pub fn trim_edge_jumps(points: Vec<TimeSeriesPoint>, trim: &TrimConfig) -> Vec<TimeSeriesPoint> {
    let len = points.len();
    if len < 2 || trim.window == 0 {
        return points;
    }

    let jumps = |i: usize| (points[i].value - points[i - 1].value).abs() >= trim.max_step;

    let mut start = 0;
    for i in 1..trim.window.min(len) {
        if jumps(i) {
            start = i;
        }
    }

    let mut end = len;
    for i in (len.saturating_sub(trim.window).max(1)..len).rev() {
        if jumps(i) {
            end = i;
        }
    }

    if start >= end {
        return Vec::new();
    }
    points[start..end].to_vec()
}
