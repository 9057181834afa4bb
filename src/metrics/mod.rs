//! Per-report metric aggregation
//!
//! Reduces the monitoring CSVs of one transcription run to the six figures
//! shown on the report:
//!
//! | Figure | Source | Reduction |
//! |--------|--------|-----------|
//! | CPU average | `CPU_Usage_Percent` | mean, `12.3%` |
//! | RAM average | `Memory_Usage_Percent` | mean, `45.6%` |
//! | Total energy | `Energy_kWh` | last row, `0.012 kWh` |
//! | Audio duration, processing time, throughput | [`ProcessingTiming`] | formatted as-is |
//!
//! Energy is a cumulative counter, which is why it takes the last reading
//! and not an average.
//!
//! Each figure is computed independently. A missing file, an empty file or
//! a missing column turns that one figure into [`MetricValue::NotAvailable`]
//! and leaves the others alone.

pub mod series;

use crate::model::{MetricValue, MetricsSnapshot, ProcessingTiming};
use series::{mean, TimeSeries, CPU_USAGE_PERCENT, ENERGY_KWH, MEMORY_USAGE_PERCENT};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use series::SeriesStats;

/// Resource logs available for one report. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSources {
    pub cpu: Option<PathBuf>,
    pub memory: Option<PathBuf>,
    pub power: Option<PathBuf>,
}

pub fn aggregate(sources: &MetricSources, timing: Option<&ProcessingTiming>) -> MetricsSnapshot {
    let cpu_avg = reduce(sources.cpu.as_deref(), CPU_USAGE_PERCENT, mean);
    let memory_avg = reduce(sources.memory.as_deref(), MEMORY_USAGE_PERCENT, mean);
    let energy_total = reduce(sources.power.as_deref(), ENERGY_KWH, |v| v.last().copied());

    let (audio_duration, processing_time, throughput) = match timing {
        Some(t) => (
            format_duration(t.audio_duration_secs),
            format_duration(t.processing_time_secs),
            format_throughput(t),
        ),
        None => Default::default(),
    };

    MetricsSnapshot {
        audio_duration,
        processing_time,
        throughput,
        cpu_avg: cpu_avg.map(format_percent).into(),
        memory_avg: memory_avg.map(format_percent).into(),
        energy_total: energy_total.map(format_energy).into(),
    }
}

/// Apply `f` to one column of one log, logging why it failed if it did.
fn reduce(path: Option<&Path>, column: &str, f: impl Fn(&[f64]) -> Option<f64>) -> Option<f64> {
    let path = path?;
    let values = TimeSeries::read(path).and_then(|series| series.require(column));
    match values {
        Ok(values) => f(&values),
        Err(e) if e.is_missing() => {
            debug!(path = %path.display(), "resource log absent");
            None
        }
        Err(e) => {
            warn!(error = %e, column, "resource log unusable");
            None
        }
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_energy(kwh: f64) -> String {
    format!("{:.3} kWh", kwh)
}

fn format_throughput(timing: &ProcessingTiming) -> MetricValue {
    if timing.processing_time_secs <= 0.0 || !timing.audio_duration_secs.is_finite() {
        return MetricValue::NotAvailable;
    }
    let ratio = timing.audio_duration_secs / timing.processing_time_secs;
    MetricValue::Available(format!("{:.2}×", ratio))
}

/// `45.2 s`, `2 min 03 s`, `1 h 02 min 03 s`.
pub fn format_duration(secs: f64) -> MetricValue {
    if !secs.is_finite() || secs < 0.0 {
        return MetricValue::NotAvailable;
    }
    if secs < 60.0 {
        return MetricValue::Available(format!("{:.1} s", secs));
    }
    let total = secs.round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    let text = if h > 0 {
        format!("{} h {:02} min {:02} s", h, m, s)
    } else {
        format!("{} min {:02} s", m, s)
    };
    MetricValue::Available(text)
}
