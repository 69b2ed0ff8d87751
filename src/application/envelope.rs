// Envelope extractor - daily min/max polygons per contiguous group
use crate::application::grouping::split;
use crate::domain::telemetry::{ContiguousGroup, DailyRange, EnvelopeBand, TimeSeriesPoint};

/// Reduce a contiguous group to one (min, max) per UTC calendar day.
pub fn envelope(group: &ContiguousGroup) -> EnvelopeBand {
    let mut days: Vec<DailyRange> = Vec::new();

    for point in &group.points {
        let day_ms = point.day_ms();
        match days.last_mut() {
            Some(day) if day.day_ms == day_ms => {
                day.min = day.min.min(point.value);
                day.max = day.max.max(point.value);
            }
            _ => days.push(DailyRange {
                day_ms,
                min: point.value,
                max: point.value,
            }),
        }
    }

    EnvelopeBand::from_days(days)
}

/// One band per contiguous run of a coarse series. Bands are never joined
/// across a hole.
pub fn envelope_bands(coarse: Vec<TimeSeriesPoint>, interval_ms: i64) -> Vec<EnvelopeBand> {
    split(coarse, interval_ms).map(|group| envelope(&group)).collect()
}
