//! Resource-log time series
//!
//! The monitoring sampler writes one CSV per resource with a header row and
//! one line per sample, e.g.:
//!
//! ```text
//! Timestamp,CPU_Usage_Percent
//! 2024-03-01 10:00:00,12.5
//! 2024-03-01 10:00:01,14.0
//! ```
//!
//! Columns are schema-on-read. Cells that do not parse as numbers (the
//! timestamp above) are simply absent from that column's numeric view, so a
//! file never fails just because it carries extra text columns.

use crate::error::{read_text, ReportError};
use std::path::{Path, PathBuf};

pub const CPU_USAGE_PERCENT: &str = "CPU_Usage_Percent";
pub const MEMORY_USAGE_PERCENT: &str = "Memory_Usage_Percent";
pub const MEMORY_USED_GB: &str = "Memory_Used_GB";
pub const MEMORY_TOTAL_GB: &str = "Memory_Total_GB";
pub const ENERGY_KWH: &str = "Energy_kWh";

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Where the rows came from, for error messages
    source: PathBuf,
    columns: Vec<String>,
    /// Row-major; `None` where the cell was missing or non-numeric
    rows: Vec<Vec<Option<f64>>>,
}

impl TimeSeries {
    /// Parse CSV text. `source` is only used to label errors.
    pub fn parse(text: &str, source: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let source = source.into();
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let columns: Vec<String> = match lines.next() {
            Some(header) => split_cells(header)
                .into_iter()
                .map(|c| unquote(c).to_string())
                .collect(),
            None => return Err(ReportError::EmptySeries(source)),
        };

        let rows: Vec<Vec<Option<f64>>> = lines
            .map(|line| {
                let mut cells: Vec<Option<f64>> = split_cells(line)
                    .into_iter()
                    .map(|c| unquote(c).parse::<f64>().ok().filter(|v| v.is_finite()))
                    .collect();
                cells.resize(columns.len(), None);
                cells
            })
            .collect();

        if rows.is_empty() {
            return Err(ReportError::EmptySeries(source));
        }

        Ok(Self {
            source,
            columns,
            rows,
        })
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let text = read_text(path)?;
        Self::parse(&text, path)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Numeric values of `name` in row order, or `None` if the column is
    /// not in the header.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row[idx]).collect())
    }

    /// Like [`column`](Self::column) but with a descriptive error, and an
    /// empty column counts as an empty series.
    pub fn require(&self, name: &str) -> Result<Vec<f64>, ReportError> {
        let values = self.column(name).ok_or_else(|| ReportError::MissingColumn {
            path: self.source.clone(),
            column: name.to_string(),
        })?;
        if values.is_empty() {
            return Err(ReportError::EmptySeries(self.source.clone()));
        }
        Ok(values)
    }
}

/// Split on commas outside double quotes. Quotes stay on the cells for
/// [`unquote`].
fn split_cells(line: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    cells.push(&line[start..]);
    cells
}

fn unquote(cell: &str) -> &str {
    let cell = cell.trim();
    cell.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(cell)
        .trim()
}

/// Scalar reductions of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub mean: f64,
    pub max: f64,
    pub last: f64,
    pub samples: usize,
}

impl SeriesStats {
    pub fn of(values: &[f64]) -> Option<Self> {
        let last = *values.last()?;
        Some(Self {
            mean: mean(values)?,
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            last,
            samples: values.len(),
        })
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPU_CSV: &str = "Timestamp,CPU_Usage_Percent\n2024-03-01 10:00:00,10\n2024-03-01 10:00:01,20\n2024-03-01 10:00:02,30\n";

    #[test]
    fn test_parse_reads_numeric_column() {
        let series = TimeSeries::parse(CPU_CSV, "cpu.csv").unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.column(CPU_USAGE_PERCENT), Some(vec![10.0, 20.0, 30.0]));
    }

    #[test]
    fn test_text_column_has_no_numeric_values() {
        let series = TimeSeries::parse(CPU_CSV, "cpu.csv").unwrap();
        assert!(series.has_column("Timestamp"));
        assert_eq!(series.column("Timestamp"), Some(vec![]));
    }

    #[test]
    fn test_missing_column_is_none() {
        let series = TimeSeries::parse(CPU_CSV, "cpu.csv").unwrap();
        assert_eq!(series.column(MEMORY_USAGE_PERCENT), None);

        let err = series.require(MEMORY_USAGE_PERCENT).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn { .. }));
    }

    #[test]
    fn test_header_only_is_empty_series() {
        let err = TimeSeries::parse("CPU_Usage_Percent\n", "cpu.csv").unwrap_err();
        assert!(matches!(err, ReportError::EmptySeries(_)));

        let err = TimeSeries::parse("", "cpu.csv").unwrap_err();
        assert!(matches!(err, ReportError::EmptySeries(_)));
    }

    #[test]
    fn test_quoted_headers_and_short_rows() {
        let csv = "\"Energy_kWh\",\"Power_W\"\n0.001,50\n0.002\n";
        let series = TimeSeries::parse(csv, "power.csv").unwrap();

        assert_eq!(series.column(ENERGY_KWH), Some(vec![0.001, 0.002]));
        assert_eq!(series.column("Power_W"), Some(vec![50.0]));
    }

    #[test]
    fn test_comma_inside_quotes_keeps_columns() {
        let csv = "Timestamp,CPU_Usage_Percent\n\"2024-03-01, 10:00:00\",10\n\"2024-03-01, 10:00:01\",20\n";
        let series = TimeSeries::parse(csv, "cpu.csv").unwrap();

        assert_eq!(series.column(CPU_USAGE_PERCENT), Some(vec![10.0, 20.0]));
        assert_eq!(series.column("Timestamp"), Some(vec![]));
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells("a,\"b,c\",d"), vec!["a", "\"b,c\"", "d"]);
        assert_eq!(split_cells(""), vec![""]);
        assert_eq!(split_cells("1,"), vec!["1", ""]);
    }

    #[test]
    fn test_nan_cells_are_dropped() {
        let series = TimeSeries::parse("v\n1\nNaN\n3\n", "x.csv").unwrap();
        assert_eq!(series.column("v"), Some(vec![1.0, 3.0]));
    }

    #[test]
    fn test_stats() {
        let stats = SeriesStats::of(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(stats.mean, 20.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.last, 30.0);
        assert_eq!(stats.samples, 3);

        assert!(SeriesStats::of(&[]).is_none());
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_read_missing_file() {
        let err = TimeSeries::read("/no/such/monitoring_cpu.csv").unwrap_err();
        assert!(err.is_missing());
    }
}
