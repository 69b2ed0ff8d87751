// CSV series source - reads one value column out of a logger or cache file
use crate::application::series_source::SeriesSource;
use crate::domain::telemetry::TimeSeriesPoint;
use crate::infrastructure::config::SeriesConfig;
use crate::infrastructure::station_csv::{parse_timestamp, parse_value};
use anyhow::{Context, Result};
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct CsvSeriesSource;

impl CsvSeriesSource {
    pub fn new() -> Self {
        Self
    }

    fn parse(text: &str, series: &SeriesConfig) -> Result<Vec<TimeSeriesPoint>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("column '{}' not found", name))
        };
        let time_idx = column(&series.time_column)?;
        let value_idx = column(&series.value_column)?;

        let mut points = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            let record = record?;
            let time = record.get(time_idx).and_then(parse_timestamp);
            let value = record.get(value_idx).and_then(parse_value);
            match (time, value) {
                (Some(time_ms), Some(value)) => points.push(TimeSeriesPoint::new(time_ms, value)),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(
                "Skipped {} rows without a usable {} value in series {}",
                skipped,
                series.value_column,
                series.id
            );
        }

        Ok(points)
    }
}

#[async_trait]
impl SeriesSource for CsvSeriesSource {
    async fn load_series(&self, series: &SeriesConfig) -> Result<Vec<TimeSeriesPoint>> {
        let text = tokio::fs::read_to_string(&series.path)
            .await
            .with_context(|| format!("Failed to open series file: {}", series.path.display()))?;

        Self::parse(&text, series)
            .with_context(|| format!("Failed to parse series file: {}", series.path.display()))
    }
}
