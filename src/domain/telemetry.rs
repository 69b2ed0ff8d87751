// Telemetry data domain models
use serde::Serialize;

pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }

    /// Start of the UTC calendar day containing this point, in epoch ms.
    pub fn day_ms(&self) -> i64 {
        self.time_ms.div_euclid(MS_PER_DAY) * MS_PER_DAY
    }
}

/// A maximal run of evenly spaced samples with no missing interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ContiguousGroup {
    pub points: Vec<TimeSeriesPoint>,
}

impl ContiguousGroup {
    pub fn new(points: Vec<TimeSeriesPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_ms(&self) -> Option<i64> {
        self.points.first().map(|p| p.time_ms)
    }

    pub fn last_ms(&self) -> Option<i64> {
        self.points.last().map(|p| p.time_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyRange {
    pub day_ms: i64,
    pub min: f64,
    pub max: f64,
}

/// Daily min/max triples of one contiguous group and the closed polygon
/// tracing them: minima forward, then maxima back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeBand {
    pub days: Vec<DailyRange>,
    pub x: Vec<i64>,
    pub y: Vec<f64>,
}

impl EnvelopeBand {
    pub fn from_days(days: Vec<DailyRange>) -> Self {
        let x = days
            .iter()
            .map(|d| d.day_ms)
            .chain(days.iter().rev().map(|d| d.day_ms))
            .collect();
        let y = days
            .iter()
            .map(|d| d.min)
            .chain(days.iter().rev().map(|d| d.max))
            .collect();

        Self { days, x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_ms_floors_negative_times() {
        let p = TimeSeriesPoint::new(-1, 0.0);
        assert_eq!(p.day_ms(), -MS_PER_DAY);

        let p = TimeSeriesPoint::new(MS_PER_DAY + 5 * MS_PER_HOUR, 0.0);
        assert_eq!(p.day_ms(), MS_PER_DAY);
    }

    #[test]
    fn test_polygon_is_forward_then_reversed() {
        let band = EnvelopeBand::from_days(vec![
            DailyRange { day_ms: 0, min: 1.0, max: 3.0 },
            DailyRange { day_ms: MS_PER_DAY, min: 2.0, max: 5.0 },
        ]);

        assert_eq!(band.x, vec![0, MS_PER_DAY, MS_PER_DAY, 0]);
        assert_eq!(band.y, vec![1.0, 2.0, 5.0, 3.0]);
    }
}
