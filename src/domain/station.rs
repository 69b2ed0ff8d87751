// Weather station domain models - date ranges and cached rows
use chrono::{Days, NaiveDate};
use std::fmt;

/// Half-open span of calendar dates, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Number of days covered; zero for an empty range.
    pub fn days(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as u64
        }
    }

    /// Split into consecutive sub-ranges of at most `max_days` days each.
    ///
    /// The pieces are returned in chronological order and cover the range
    /// exactly; only the last one may be shorter than `max_days`.
    pub fn segments(&self, max_days: u64) -> Vec<DateRange> {
        let mut segments = Vec::new();
        if self.is_empty() || max_days == 0 {
            return segments;
        }

        let mut current = self.start;
        while current < self.end {
            let next = current
                .checked_add_days(Days::new(max_days))
                .map_or(self.end, |d| d.min(self.end));
            segments.push(DateRange::new(current, next));
            current = next;
        }

        segments
    }

    /// File stem of the artifact produced for this range, e.g. `20200601-20200611`.
    pub fn artifact_stem(&self) -> String {
        format!(
            "{}-{}",
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// One cached weather-station row: a timestamp and one value per metric column.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRow {
    pub time_ms: i64,
    pub values: Vec<Option<f64>>,
}

impl StationRow {
    pub fn new(time_ms: i64, values: Vec<Option<f64>>) -> Self {
        Self { time_ms, values }
    }

    /// Key identifying the full row content; equal keys mean exact duplicates.
    pub fn content_key(&self) -> (i64, Vec<Option<u64>>) {
        (
            self.time_ms,
            self.values.iter().map(|v| v.map(f64::to_bits)).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_segments_25_days_by_10() {
        let range = DateRange::new(date(2020, 6, 1), date(2020, 6, 26));
        let segments = range.segments(10);

        let lengths: Vec<u64> = segments.iter().map(|s| s.days()).collect();
        assert_eq!(lengths, vec![10, 10, 5]);
        assert_eq!(segments[0].start, date(2020, 6, 1));
        assert_eq!(segments[1].start, date(2020, 6, 11));
        assert_eq!(segments[2].start, date(2020, 6, 21));
        assert_eq!(segments[2].end, date(2020, 6, 26));
    }

    #[test]
    fn test_segments_reconstruct_range() {
        let start = date(2019, 12, 20);
        for total in 1..40u64 {
            for size in 1..15u64 {
                let range = DateRange::new(start, start + Days::new(total));
                let segments = range.segments(size);

                assert_eq!(segments.first().unwrap().start, range.start);
                assert_eq!(segments.last().unwrap().end, range.end);
                for pair in segments.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }
                let (last, rest) = segments.split_last().unwrap();
                assert!(rest.iter().all(|s| s.days() == size));
                assert!(last.days() <= size && last.days() > 0);
            }
        }
    }

    #[test]
    fn test_empty_range_has_no_segments() {
        let range = DateRange::new(date(2020, 6, 1), date(2020, 6, 1));
        assert!(range.segments(10).is_empty());

        let reversed = DateRange::new(date(2020, 6, 2), date(2020, 6, 1));
        assert!(reversed.segments(10).is_empty());
        assert_eq!(reversed.days(), 0);
    }

    #[test]
    fn test_artifact_stem() {
        let range = DateRange::new(date(2020, 6, 1), date(2020, 6, 11));
        assert_eq!(range.artifact_stem(), "20200601-20200611");
    }

    #[test]
    fn test_content_key_distinguishes_values() {
        let a = StationRow::new(0, vec![Some(1.0), None]);
        let b = StationRow::new(0, vec![Some(1.0), Some(2.0)]);
        assert_ne!(a.content_key(), b.content_key());
        assert_eq!(a.content_key(), a.clone().content_key());
    }
}
