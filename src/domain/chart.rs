// Envelope chart domain model - what the rendering side consumes
use super::telemetry::EnvelopeBand;
use serde::Serialize;

/// One band polygon tagged with the series it came from.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedBand {
    pub series_id: String,
    pub name: String,
    pub color: Option<String>,
    pub band: EnvelopeBand,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeChart {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub bands: Vec<TaggedBand>,
}

impl EnvelopeChart {
    pub fn new(id: String, title: String, unit: Option<String>, bands: Vec<TaggedBand>) -> Self {
        Self {
            id,
            title,
            unit,
            bands,
        }
    }

    pub fn axis_label(&self) -> String {
        axis_label(&self.title, self.unit.as_deref())
    }
}

/// Axis label, e.g. `Temperature (C)`; just the title when there is no unit.
pub fn axis_label(title: &str, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{} ({})", title, unit),
        None => title.to_string(),
    }
}

/// Chart metadata without geometry, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSummary {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub axis_label: String,
    pub series: Vec<String>,
}
