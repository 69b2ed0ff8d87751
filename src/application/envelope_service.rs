// Envelope service - Use case for building envelope charts
use crate::application::envelope::envelope_bands;
use crate::application::normalizer::{normalize_series, normalizer_for, trim_edge_jumps};
use crate::application::resampler::GapAwareResampler;
use crate::application::series_source::SeriesSource;
use crate::domain::chart::{axis_label, ChartSummary, EnvelopeChart, TaggedBand};
use crate::infrastructure::config::{ChartConfig, SeriesConfig};
use std::sync::Arc;

#[derive(Clone)]
pub struct EnvelopeService {
    source: Arc<dyn SeriesSource>,
    charts: Vec<ChartConfig>,
    resampler: GapAwareResampler,
}

impl EnvelopeService {
    pub fn new(
        source: Arc<dyn SeriesSource>,
        charts: Vec<ChartConfig>,
        resampler: GapAwareResampler,
    ) -> Self {
        Self {
            source,
            charts,
            resampler,
        }
    }

    pub fn list_charts(&self) -> Vec<ChartSummary> {
        self.charts.iter().map(summarize).collect()
    }

    pub fn chart_summary(&self, chart_id: &str) -> Option<ChartSummary> {
        self.find(chart_id).map(summarize)
    }

    /// Build one chart; `None` when no chart has that id.
    pub async fn build_chart(&self, chart_id: &str) -> Option<EnvelopeChart> {
        let chart_config = self.find(chart_id)?;

        let mut bands = Vec::new();
        for series_config in &chart_config.series {
            bands.extend(self.fetch_series(chart_config, series_config).await);
        }

        Some(EnvelopeChart::new(
            chart_config.id.clone(),
            chart_config.title.clone(),
            chart_config.unit.clone(),
            bands,
        ))
    }

    /// Build every configured chart that ends up with at least one band.
    pub async fn build_all(&self) -> Vec<EnvelopeChart> {
        let mut charts = Vec::new();

        for chart_config in &self.charts {
            if let Some(chart) = self.build_chart(&chart_config.id).await {
                if chart.bands.is_empty() {
                    tracing::warn!("Chart {} has no data, leaving it out", chart.id);
                    continue;
                }
                charts.push(chart);
            }
        }

        charts
    }

    /// Bands of one series. Load failures are logged and yield no bands so
    /// the rest of the chart still renders.
    pub(crate) async fn fetch_series(
        &self,
        chart_config: &ChartConfig,
        series_config: &SeriesConfig,
    ) -> Vec<TaggedBand> {
        match self.series_bands(series_config).await {
            Ok(bands) => bands,
            Err(e) => {
                tracing::warn!(
                    "Error fetching series {} for chart {}: {:#}",
                    series_config.id,
                    chart_config.id,
                    e
                );
                Vec::new()
            }
        }
    }

    async fn series_bands(&self, series_config: &SeriesConfig) -> anyhow::Result<Vec<TaggedBand>> {
        let raw = self.source.load_series(series_config).await?;
        let raw_len = raw.len();

        let normalizer = normalizer_for(series_config);
        let mut points = normalize_series(raw, normalizer.as_ref());
        if let Some(trim) = &series_config.trim {
            points = trim_edge_jumps(points, trim);
        }

        let coarse = self.resampler.resample(points);
        let coarse_len = coarse.len();
        let bands = envelope_bands(coarse, self.resampler.coarse_interval_ms());

        tracing::debug!(
            "Series {}: {} raw samples, {} coarse samples, {} bands",
            series_config.id,
            raw_len,
            coarse_len,
            bands.len()
        );

        Ok(bands
            .into_iter()
            .map(|band| TaggedBand {
                series_id: series_config.id.clone(),
                name: series_config.name.clone(),
                color: series_config.color.clone(),
                band,
            })
            .collect())
    }

    pub(crate) fn find(&self, chart_id: &str) -> Option<&ChartConfig> {
        self.charts.iter().find(|c| c.id == chart_id)
    }
}

fn summarize(chart: &ChartConfig) -> ChartSummary {
    ChartSummary {
        id: chart.id.clone(),
        title: chart.title.clone(),
        axis_label: axis_label(&chart.title, chart.unit.as_deref()),
        unit: chart.unit.clone(),
        series: chart.series.iter().map(|s| s.id.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::{TimeSeriesPoint, MS_PER_DAY, MS_PER_HOUR};
    use crate::infrastructure::config::{ResampleConfig, TrimConfig};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;

    struct FakeSource {
        series: HashMap<String, Vec<TimeSeriesPoint>>,
    }

    #[async_trait]
    impl SeriesSource for FakeSource {
        async fn load_series(&self, series: &SeriesConfig) -> anyhow::Result<Vec<TimeSeriesPoint>> {
            self.series
                .get(&series.id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such file"))
        }
    }

    fn series_config(id: &str) -> SeriesConfig {
        SeriesConfig {
            id: id.into(),
            name: id.to_uppercase(),
            color: Some("#492365".into()),
            path: PathBuf::from(format!("{id}.csv")),
            time_column: "timestamp".into(),
            value_column: "value".into(),
            scale: 1.0,
            offset: 0.0,
            trim: None,
        }
    }

    fn chart(series: Vec<SeriesConfig>) -> ChartConfig {
        ChartConfig {
            id: "temperature".into(),
            title: "Temperature".into(),
            unit: Some("C".into()),
            series,
        }
    }

    fn hourly(range: std::ops::Range<i64>, value: impl Fn(i64) -> f64) -> Vec<TimeSeriesPoint> {
        range.map(|h| TimeSeriesPoint::new(h * MS_PER_HOUR, value(h))).collect()
    }

    fn service(series: HashMap<String, Vec<TimeSeriesPoint>>, charts: Vec<ChartConfig>) -> EnvelopeService {
        EnvelopeService::new(
            Arc::new(FakeSource { series }),
            charts,
            GapAwareResampler::new(&ResampleConfig::default()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_bands_are_tagged_per_series() {
        let mut data = HashMap::new();
        data.insert("a".to_string(), hourly(0..48, |h| h as f64));
        data.insert("b".to_string(), hourly(0..24, |_| 5.0));
        let svc = service(data, vec![chart(vec![series_config("a"), series_config("b")])]);

        let chart = svc.build_chart("temperature").await.unwrap();

        assert_eq!(chart.bands.len(), 2);
        assert_eq!(chart.bands[0].series_id, "a");
        assert_eq!(chart.bands[0].band.days.len(), 2);
        assert_eq!(chart.bands[1].name, "B");
        assert_eq!(chart.bands[1].band.days[0].max, 5.0);
    }

    #[tokio::test]
    async fn test_failing_series_is_skipped() {
        let mut data = HashMap::new();
        data.insert("a".to_string(), hourly(0..5, |_| 1.0));
        let svc = service(data, vec![chart(vec![series_config("missing"), series_config("a")])]);

        let chart = svc.build_chart("temperature").await.unwrap();

        assert_eq!(chart.bands.len(), 1);
        assert_eq!(chart.bands[0].series_id, "a");
    }

    #[tokio::test]
    async fn test_normalization_and_trim_are_applied() {
        let mut config = series_config("a");
        config.scale = 2.0;
        config.offset = 1.0;
        config.trim = Some(TrimConfig { max_step: 50.0, window: 3 });

        let mut raw = hourly(0..24, |_| 10.0);
        raw[0].value = 200.0;
        let mut data = HashMap::new();
        data.insert("a".to_string(), raw);
        let svc = service(data, vec![chart(vec![config])]);

        let chart = svc.build_chart("temperature").await.unwrap();
        let day = chart.bands[0].band.days[0];

        assert_eq!((day.min, day.max), (21.0, 21.0));
    }

    #[tokio::test]
    async fn test_gap_splits_series_into_two_bands() {
        let mut points = hourly(0..72, |h| if h % 2 == 0 { 10.0 } else { 20.0 });
        points.retain(|p| !(30 * MS_PER_HOUR..=42 * MS_PER_HOUR).contains(&p.time_ms));
        let mut data = HashMap::new();
        data.insert("a".to_string(), points);
        let svc = service(data, vec![chart(vec![series_config("a")])]);

        let chart = svc.build_chart("temperature").await.unwrap();

        assert_eq!(chart.bands.len(), 2);
        let days = |i: usize| -> Vec<i64> {
            chart.bands[i].band.days.iter().map(|d| d.day_ms / MS_PER_DAY).collect()
        };
        assert_eq!(days(0), vec![0, 1]);
        assert_eq!(days(1), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_unknown_chart_and_empty_charts() {
        let svc = service(HashMap::new(), vec![chart(vec![series_config("a")])]);

        assert!(svc.build_chart("pressure").await.is_none());
        assert!(svc.build_all().await.is_empty());

        let summaries = svc.list_charts();
        assert_eq!(summaries[0].axis_label, "Temperature (C)");
        assert_eq!(summaries[0].series, vec!["a"]);
    }
}
