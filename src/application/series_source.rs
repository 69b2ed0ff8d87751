// Series source trait - where raw measurement columns come from
use crate::domain::telemetry::TimeSeriesPoint;
use crate::infrastructure::config::SeriesConfig;
use async_trait::async_trait;

#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Load the raw (timestamp, value) samples a series is configured with,
    /// in file order. Rows whose value is missing or non-numeric are skipped.
    async fn load_series(&self, series: &SeriesConfig) -> anyhow::Result<Vec<TimeSeriesPoint>>;
}
