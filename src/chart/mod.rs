//! Monitoring charts
//!
//! Turns the resource logs of a session into PNG line charts that the HTML
//! report later embeds.
//!
//! # Pipeline
//!
//! ```text
//! monitoring_*.csv ──> TimeSeries ──> Chart (panels, series, reference lines)
//!                                          │
//!                                  svg::render  (pure, deterministic markup)
//!                                          │
//!                                  raster::write_png  (resvg + png, 300 DPI)
//! ```
//!
//! The [`Chart`] value is the whole visual description, so tests can check
//! where the mean line sits without decoding pixels.
//!
//! # Charts
//!
//! | Log | Image | Panels |
//! |-----|-------|--------|
//! | `monitoring_cpu.csv` | `cpu_usage.png` | CPU % with mean line |
//! | `monitoring_memory.csv` | `memory_usage.png` | RAM % with mean and 90% alert lines; RAM GB vs total when available |
//! | `monitoring_power.csv` | `power_usage.png` | cumulative kWh with final total line |

pub mod raster;
pub mod svg;

use crate::error::ReportError;
use crate::metrics::series::{
    TimeSeries, CPU_USAGE_PERCENT, ENERGY_KWH, MEMORY_TOTAL_GB, MEMORY_USAGE_PERCENT,
    MEMORY_USED_GB,
};
use crate::metrics::SeriesStats;
use resvg::usvg::fontdb::Database;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

pub const DEFAULT_DPI: f32 = 300.0;

/// Memory usage above this is worth an operator's attention.
pub const MEMORY_ALERT_PERCENT: f64 = 90.0;

const CHART_WIDTH: f64 = 1400.0;
const SINGLE_PANEL_HEIGHT: f64 = 600.0;
const STACKED_PANEL_HEIGHT: f64 = 500.0;

const CPU_COLOR: &str = "#2E86AB";
const MEMORY_COLOR: &str = "#A23B72";
const MEMORY_GB_COLOR: &str = "#F18F01";
const POWER_COLOR: &str = "#3B8B5A";
const MEAN_COLOR: &str = "red";
const ALERT_COLOR: &str = "orange";
const CAPACITY_COLOR: &str = "gray";

const X_LABEL: &str = "Temps (échantillons)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dash {
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub value: f64,
    pub label: String,
    pub color: &'static str,
    pub dash: Dash,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: Option<String>,
    pub values: Vec<f64>,
    pub color: &'static str,
    /// Shade the area under the line
    pub filled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_range: (f64, f64),
    pub series: Vec<Series>,
    pub reference_lines: Vec<ReferenceLine>,
}

impl Panel {
    pub fn has_legend(&self) -> bool {
        !self.reference_lines.is_empty() || self.series.iter().any(|s| s.label.is_some())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub width: f64,
    pub panel_height: f64,
    pub panels: Vec<Panel>,
}

impl Chart {
    pub fn height(&self) -> f64 {
        self.panel_height * self.panels.len() as f64
    }
}

/// The three monitoring charts and their well-known file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Cpu,
    Memory,
    Power,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Cpu, ChartKind::Memory, ChartKind::Power];

    pub fn log_file(self) -> &'static str {
        match self {
            ChartKind::Cpu => "monitoring_cpu.csv",
            ChartKind::Memory => "monitoring_memory.csv",
            ChartKind::Power => "monitoring_power.csv",
        }
    }

    pub fn image_file(self) -> &'static str {
        match self {
            ChartKind::Cpu => "cpu_usage.png",
            ChartKind::Memory => "memory_usage.png",
            ChartKind::Power => "power_usage.png",
        }
    }

    pub fn build(self, series: &TimeSeries) -> Result<(Chart, SeriesStats), ReportError> {
        match self {
            ChartKind::Cpu => cpu_chart(series),
            ChartKind::Memory => memory_chart(series),
            ChartKind::Power => power_chart(series),
        }
    }
}

fn stats_of(series: &TimeSeries, column: &str) -> Result<(Vec<f64>, SeriesStats), ReportError> {
    let values = series.require(column)?;
    let stats =
        SeriesStats::of(&values).ok_or_else(|| ReportError::EmptySeries(series.source().into()))?;
    Ok((values, stats))
}

fn mean_line(mean: f64, unit: &str) -> ReferenceLine {
    ReferenceLine {
        value: mean,
        label: format!("Moyenne: {:.1}{}", mean, unit),
        color: MEAN_COLOR,
        dash: Dash::Dashed,
    }
}

/// Single filled panel of CPU usage with a dashed line at the mean.
pub fn cpu_chart(series: &TimeSeries) -> Result<(Chart, SeriesStats), ReportError> {
    let (values, stats) = stats_of(series, CPU_USAGE_PERCENT)?;

    let panel = Panel {
        title: "Utilisation CPU - Station TV".to_string(),
        x_label: X_LABEL.to_string(),
        y_label: "Utilisation CPU (%)".to_string(),
        y_range: (0.0, 100.0),
        series: vec![Series {
            label: None,
            values,
            color: CPU_COLOR,
            filled: true,
        }],
        reference_lines: vec![mean_line(stats.mean, "%")],
    };

    Ok((
        Chart {
            width: CHART_WIDTH,
            panel_height: SINGLE_PANEL_HEIGHT,
            panels: vec![panel],
        },
        stats,
    ))
}

/// RAM percentage panel, plus an absolute GB panel when the log has both
/// used and total columns.
pub fn memory_chart(series: &TimeSeries) -> Result<(Chart, SeriesStats), ReportError> {
    let (values, stats) = stats_of(series, MEMORY_USAGE_PERCENT)?;

    let mut panels = vec![Panel {
        title: "Utilisation RAM (%) - Station TV".to_string(),
        x_label: X_LABEL.to_string(),
        y_label: "Utilisation RAM (%)".to_string(),
        y_range: (0.0, 100.0),
        series: vec![Series {
            label: None,
            values,
            color: MEMORY_COLOR,
            filled: true,
        }],
        reference_lines: vec![
            mean_line(stats.mean, "%"),
            ReferenceLine {
                value: MEMORY_ALERT_PERCENT,
                label: format!("Seuil alerte: {:.0}%", MEMORY_ALERT_PERCENT),
                color: ALERT_COLOR,
                dash: Dash::Dotted,
            },
        ],
    }];

    if let Some(panel) = absolute_memory_panel(series) {
        panels.push(panel);
    }

    let panel_height = if panels.len() > 1 {
        STACKED_PANEL_HEIGHT
    } else {
        SINGLE_PANEL_HEIGHT
    };

    Ok((
        Chart {
            width: CHART_WIDTH,
            panel_height,
            panels,
        },
        stats,
    ))
}

fn absolute_memory_panel(series: &TimeSeries) -> Option<Panel> {
    let used = series.column(MEMORY_USED_GB)?;
    let total = *series.column(MEMORY_TOTAL_GB)?.first()?;
    if used.is_empty() {
        return None;
    }

    let peak = used.iter().copied().fold(total, f64::max);
    Some(Panel {
        title: "Utilisation RAM (Go) - Station TV".to_string(),
        x_label: X_LABEL.to_string(),
        y_label: "RAM utilisée (Go)".to_string(),
        y_range: (0.0, nice_ceiling(peak * 1.05)),
        series: vec![Series {
            label: Some("RAM utilisée".to_string()),
            values: used,
            color: MEMORY_GB_COLOR,
            filled: true,
        }],
        reference_lines: vec![ReferenceLine {
            value: total,
            label: format!("RAM totale: {:.1} Go", total),
            color: CAPACITY_COLOR,
            dash: Dash::Dashed,
        }],
    })
}

/// Cumulative energy with a dashed line at the final reading.
pub fn power_chart(series: &TimeSeries) -> Result<(Chart, SeriesStats), ReportError> {
    let (values, stats) = stats_of(series, ENERGY_KWH)?;

    let panel = Panel {
        title: "Consommation énergétique - Station TV".to_string(),
        x_label: X_LABEL.to_string(),
        y_label: "Énergie cumulée (kWh)".to_string(),
        y_range: (0.0, nice_ceiling(stats.max.max(0.0) * 1.1)),
        series: vec![Series {
            label: None,
            values,
            color: POWER_COLOR,
            filled: true,
        }],
        reference_lines: vec![ReferenceLine {
            value: stats.last,
            label: format!("Total: {:.3} kWh", stats.last),
            color: MEAN_COLOR,
            dash: Dash::Dashed,
        }],
    };

    Ok((
        Chart {
            width: CHART_WIDTH,
            panel_height: SINGLE_PANEL_HEIGHT,
            panels: vec![panel],
        },
        stats,
    ))
}

/// Round an axis maximum up to 1, 2, 2.5 or 5 times a power of ten.
fn nice_ceiling(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(value.log10().floor());
    let normalized = value / magnitude;
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|s| normalized <= *s + 1e-9)
        .unwrap_or(10.0);
    step * magnitude
}

/// Renders monitoring charts to PNG files.
///
/// System fonts are loaded once when the renderer is created and shared by
/// every chart it draws, including through clones.
#[derive(Clone)]
pub struct ChartRenderer {
    pub dpi: f32,
    fonts: Arc<Database>,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            fonts: raster::system_fonts(),
        }
    }
}

impl fmt::Debug for ChartRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartRenderer")
            .field("dpi", &self.dpi)
            .field("font_faces", &self.fonts.len())
            .finish()
    }
}

/// What happened when rendering a directory of logs.
#[derive(Debug, Default)]
pub struct ChartOutcome {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(ChartKind, ReportError)>,
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Read `csv`, build the chart of `kind` and write it to `out`.
    ///
    /// Nothing is written unless the whole chart rendered.
    pub fn render(&self, kind: ChartKind, csv: &Path, out: &Path) -> Result<SeriesStats, ReportError> {
        let series = TimeSeries::read(csv)?;
        let (chart, stats) = kind.build(&series)?;
        raster::write_png(&svg::render(&chart), out, self.dpi, &self.fonts)?;

        info!(
            chart = kind.image_file(),
            path = %out.display(),
            mean = stats.mean,
            max = stats.max,
            "chart written"
        );
        Ok(stats)
    }

    pub fn render_cpu(&self, csv: &Path, out: &Path) -> Result<SeriesStats, ReportError> {
        self.render(ChartKind::Cpu, csv, out)
    }

    pub fn render_memory(&self, csv: &Path, out: &Path) -> Result<SeriesStats, ReportError> {
        self.render(ChartKind::Memory, csv, out)
    }

    pub fn render_power(&self, csv: &Path, out: &Path) -> Result<SeriesStats, ReportError> {
        self.render(ChartKind::Power, csv, out)
    }

    /// Render every chart whose log exists in `log_dir` into `out_dir`.
    ///
    /// Each chart is independent: a bad CPU log does not stop the memory
    /// chart.
    pub fn render_all(&self, log_dir: &Path, out_dir: &Path) -> ChartOutcome {
        let mut outcome = ChartOutcome::default();

        for kind in ChartKind::ALL {
            let csv = log_dir.join(kind.log_file());
            let out = out_dir.join(kind.image_file());
            match self.render(kind, &csv, &out) {
                Ok(_) => outcome.written.push(out),
                Err(e) => {
                    error!(error = %e, chart = kind.image_file(), "chart not generated");
                    outcome.failed.push((kind, e));
                }
            }
        }

        outcome
    }
}
