// Contiguous group splitter - cuts a regular series at its holes
use crate::domain::telemetry::{ContiguousGroup, TimeSeriesPoint};
use std::iter::{FusedIterator, Peekable};

/// Single-pass producer of maximal contiguous runs.
///
/// Owns the underlying points; once a group has been yielded it cannot be
/// produced again.
pub struct ContiguousGroups<I: Iterator<Item = TimeSeriesPoint>> {
    points: Peekable<I>,
    interval_ms: i64,
}

/// Split `series` wherever consecutive samples are not exactly `interval_ms` apart.
pub fn split<S>(series: S, interval_ms: i64) -> ContiguousGroups<S::IntoIter>
where
    S: IntoIterator<Item = TimeSeriesPoint>,
{
    ContiguousGroups {
        points: series.into_iter().peekable(),
        interval_ms,
    }
}

impl<I: Iterator<Item = TimeSeriesPoint>> Iterator for ContiguousGroups<I> {
    type Item = ContiguousGroup;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.points.next()?;
        let interval = self.interval_ms;

        let mut run = vec![first];
        let mut last_ms = first.time_ms;
        while let Some(point) = self
            .points
            .next_if(|p| p.time_ms.checked_sub(last_ms) == Some(interval))
        {
            last_ms = point.time_ms;
            run.push(point);
        }

        Some(ContiguousGroup::new(run))
    }
}

impl<I: Iterator<Item = TimeSeriesPoint>> FusedIterator for ContiguousGroups<I> {}
