//! Normalized report model
//!
//! Every renderer consumes these types and nothing else, so the HTML report
//! and the plain-text summary never re-derive figures on their own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker printed wherever a figure could not be computed.
pub const NOT_AVAILABLE: &str = "N/A";

/// One subtitle cue, in source order.
///
/// `index` and `time_range` are kept verbatim; no timecode grammar is
/// assumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub index: String,
    pub time_range: String,
    pub text: String,
}

/// A formatted figure, or the explicit "not available" marker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(into = "String")]
pub enum MetricValue {
    Available(String),
    #[default]
    NotAvailable,
}

impl MetricValue {
    pub fn is_available(&self) -> bool {
        matches!(self, MetricValue::Available(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            MetricValue::Available(s) => s,
            MetricValue::NotAvailable => NOT_AVAILABLE,
        }
    }
}

impl From<Option<String>> for MetricValue {
    fn from(value: Option<String>) -> Self {
        value.map(MetricValue::Available).unwrap_or_default()
    }
}

impl From<MetricValue> for String {
    fn from(value: MetricValue) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived scalars for a single report. Every field is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub audio_duration: MetricValue,
    pub processing_time: MetricValue,
    pub throughput: MetricValue,
    pub cpu_avg: MetricValue,
    pub memory_avg: MetricValue,
    pub energy_total: MetricValue,
}

impl MetricsSnapshot {
    /// Cards in display order, paired with their labels.
    pub fn cards(&self) -> [(&'static str, &MetricValue); 6] {
        [
            ("Durée Audio", &self.audio_duration),
            ("Temps de Traitement", &self.processing_time),
            ("Throughput", &self.throughput),
            ("CPU Moyen", &self.cpu_avg),
            ("RAM Moyenne", &self.memory_avg),
            ("Énergie Totale", &self.energy_total),
        ]
    }
}

/// Upstream pipeline timing for one item, when the caller has it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingTiming {
    pub audio_duration_secs: f64,
    pub processing_time_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMetadata {
    pub filename: String,
    pub model: String,
    pub language: String,
    pub date: String,
}

impl ReportMetadata {
    pub fn items(&self) -> [(&'static str, &str); 4] {
        [
            ("Fichier Source", self.filename.as_str()),
            ("Modèle Whisper", self.model.as_str()),
            ("Langue", self.language.as_str()),
            ("Date de Transcription", self.date.as_str()),
        ]
    }
}

/// Inline image: MIME type plus base64 payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedImage {
    pub mime_type: &'static str,
    pub payload: String,
}

/// A logical chart slot (`cpu_usage.png`, ...) that may or may not have
/// loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedImage {
    pub name: String,
    pub image: Option<EmbeddedImage>,
}

/// Everything the HTML renderer needs for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub transcription: String,
    pub segments: Vec<Segment>,
    pub metadata: ReportMetadata,
    pub metrics: MetricsSnapshot,
    pub images: Vec<NamedImage>,
}

impl ReportDocument {
    pub fn available_images(&self) -> impl Iterator<Item = (&str, &EmbeddedImage)> {
        self.images
            .iter()
            .filter_map(|n| n.image.as_ref().map(|img| (n.name.as_str(), img)))
    }
}

/// Session-wide aggregates, computed by the pipeline and passed in as-is.
///
/// Missing keys in the JSON default to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSummary {
    pub total_files: u64,
    pub successful_files: u64,
    pub failed_files: u64,
    /// Fraction in `0.0..=1.0`
    pub success_rate: f64,
    pub session_duration_hours: f64,
    pub total_audio_duration_hours: f64,
    pub total_processing_time_hours: f64,
    /// Audio time processed per unit of wall-clock time
    pub throughput: f64,
    pub average_processing_time_seconds: f64,
}
