// Streaming chart service - Progressive delivery of envelope bands
use crate::application::envelope_service::EnvelopeService;
use crate::domain::chart::{ChartSummary, TaggedBand};
use serde::Serialize;
use std::time::Instant;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    Skeleton(ChartSummary),
    Band(TaggedBand),
    Complete { bands: usize, duration_ms: u64 },
}

#[derive(Clone)]
pub struct StreamingChartService {
    envelopes: EnvelopeService,
}

impl StreamingChartService {
    pub fn new(envelopes: EnvelopeService) -> Self {
        Self { envelopes }
    }

    /// Skeleton first, then every band as its series finishes, then a
    /// completion frame. `None` when the chart does not exist.
    pub fn stream_chart(&self, chart_id: &str) -> Option<mpsc::Receiver<StreamFrame>> {
        let summary = self.envelopes.chart_summary(chart_id)?;
        let (tx, rx) = mpsc::channel(100);
        let envelopes = self.envelopes.clone();
        let chart_id = chart_id.to_string();
        let start_time = Instant::now();

        tokio::spawn(async move {
            if tx.send(StreamFrame::Skeleton(summary)).await.is_err() {
                return;
            }

            let Some(chart_config) = envelopes.find(&chart_id).cloned() else {
                return;
            };

            // Series are processed in order so bands keep their chart order
            let mut sent = 0usize;
            for series_config in &chart_config.series {
                for band in envelopes.fetch_series(&chart_config, series_config).await {
                    if tx.send(StreamFrame::Band(band)).await.is_err() {
                        tracing::debug!("Client for chart {} went away", chart_id);
                        return;
                    }
                    sent += 1;
                }
            }

            let duration_ms = start_time.elapsed().as_millis() as u64;
            let _ = tx
                .send(StreamFrame::Complete {
                    bands: sent,
                    duration_ms,
                })
                .await;
        });

        Some(rx)
    }
}
