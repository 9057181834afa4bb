//! Per-item report assembly
//!
//! A transcription run leaves its artifacts side by side in one directory:
//!
//! ```text
//! transcriptions/
//! ├── journal_20h.txt          transcript (required)
//! ├── journal_20h.srt          timed text
//! ├── monitoring_cpu.csv       resource logs
//! ├── monitoring_memory.csv
//! ├── monitoring_power.csv
//! ├── cpu_usage.png            charts
//! ├── memory_usage.png
//! └── power_usage.png
//! ```
//!
//! [`ItemArtifacts::discover`] resolves that layout into paths; everything
//! after that works on resolved paths only. Only the transcript is
//! required: every other artifact that is missing or broken turns into an
//! `N/A` card or an omitted section.

use crate::chart::ChartKind;
use crate::error::{read_text, ReportError};
use crate::metrics::{self, MetricSources};
use crate::model::{
    EmbeddedImage, NamedImage, ProcessingTiming, ReportDocument, ReportMetadata,
};
use crate::{report, timed_text};
use chrono::Local;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

pub const DEFAULT_OUTPUT_DIR: &str = "output/reports";
pub const DEFAULT_MODEL: &str = "small";
pub const DEFAULT_LANGUAGE: &str = "fr";

/// Resolved input paths for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemArtifacts {
    pub transcript: PathBuf,
    pub subtitles: Option<PathBuf>,
    pub metric_sources: MetricSources,
    /// Chart slots in display order; `None` when the image is not on disk
    pub images: Vec<(String, Option<PathBuf>)>,
}

impl ItemArtifacts {
    /// Locate the artifacts of `item` in `dir`.
    ///
    /// Transcript and timed text are `{item}.txt` / `{item}.srt` when
    /// present, otherwise the first (by file name) whose name contains
    /// `item`. Logs and charts use their fixed names.
    pub fn discover(dir: &Path, item: &str) -> Result<Self, ReportError> {
        let files = list_files(dir);

        let transcript = first_match(&files, item, "txt")
            .ok_or_else(|| ReportError::MissingInput(dir.join(format!("{item}.txt"))))?;
        let subtitles = first_match(&files, item, "srt");

        let existing = |name: &str| Some(dir.join(name)).filter(|p| p.is_file());

        let metric_sources = MetricSources {
            cpu: existing(ChartKind::Cpu.log_file()),
            memory: existing(ChartKind::Memory.log_file()),
            power: existing(ChartKind::Power.log_file()),
        };

        let images = ChartKind::ALL
            .iter()
            .map(|kind| (kind.image_file().to_string(), existing(kind.image_file())))
            .collect();

        debug!(
            item,
            transcript = %transcript.display(),
            subtitles = subtitles.is_some(),
            "artifacts discovered"
        );

        Ok(Self {
            transcript,
            subtitles,
            metric_sources,
            images,
        })
    }
}

/// Regular files directly inside `dir`, sorted by file name.
fn list_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

/// An exact `{item}.{ext}` wins over substring matches, so item `b` never
/// picks up `ab.txt`.
fn first_match(files: &[PathBuf], item: &str, ext: &str) -> Option<PathBuf> {
    let with_ext = files
        .iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(ext));

    with_ext
        .clone()
        .find(|p| p.file_stem().and_then(|s| s.to_str()) == Some(item))
        .or_else(|| {
            with_ext.clone().find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.contains(item))
                    .unwrap_or(false)
            })
        })
        .cloned()
}

/// Item names available in `dir`: the stems of its `.txt` files.
pub fn discover_items(dir: &Path) -> Result<Vec<String>, ReportError> {
    if !dir.is_dir() {
        return Err(ReportError::MissingInput(dir.to_path_buf()));
    }

    let mut items: Vec<String> = list_files(dir)
        .iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("txt"))
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
        .collect();
    items.sort();
    items.dedup();
    Ok(items)
}

/// Settings shared by every report of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub model: String,
    pub language: String,
    /// Transcription date shown in the metadata; defaults to now
    pub date: Option<String>,
    pub timing: Option<ProcessingTiming>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            model: DEFAULT_MODEL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            date: None,
            timing: None,
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_timing(mut self, timing: ProcessingTiming) -> Self {
        self.timing = Some(timing);
        self
    }
}

/// Result for one item of a batch.
#[derive(Debug)]
pub struct ItemOutcome {
    pub item: String,
    pub result: Result<PathBuf, ReportError>,
}

/// Per-item results of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub items: Vec<ItemOutcome>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.items
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|p| (o.item.as_str(), p.as_path())))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ReportError)> {
        self.items
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.item.as_str(), e)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.items.iter().all(|o| o.result.is_ok())
    }
}

/// Drives parsing, aggregation, embedding and rendering for items.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    pub config: ReportConfig,
}

impl Orchestrator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// `{output_dir}/{item}_report.html`
    pub fn default_output(&self, item: &str) -> PathBuf {
        self.config.output_dir.join(format!("{item}_report.html"))
    }

    /// Assemble the document. Only a transcript read failure is an error.
    pub fn build_document(
        &self,
        artifacts: &ItemArtifacts,
        item: &str,
    ) -> Result<ReportDocument, ReportError> {
        let transcription = read_text(&artifacts.transcript)?;

        let segments = artifacts
            .subtitles
            .as_ref()
            .map(timed_text::load)
            .unwrap_or_default();

        let metrics = metrics::aggregate(&artifacts.metric_sources, self.config.timing.as_ref());

        let images = artifacts
            .images
            .iter()
            .map(|(name, path)| NamedImage {
                name: name.clone(),
                image: path.as_ref().and_then(EmbeddedImage::load),
            })
            .collect();

        let date = self
            .config
            .date
            .clone()
            .unwrap_or_else(|| Local::now().format("%d/%m/%Y %H:%M:%S").to_string());

        Ok(ReportDocument {
            title: format!("Rapport de Transcription - {item}"),
            transcription,
            segments,
            metadata: ReportMetadata {
                filename: item.to_string(),
                model: self.config.model.clone(),
                language: self.config.language.clone(),
                date,
            },
            metrics,
            images,
        })
    }

    /// Discover, assemble and write the report for `item`.
    ///
    /// Returns the written path. On error nothing is written.
    pub fn generate(
        &self,
        dir: &Path,
        item: &str,
        output: Option<&Path>,
    ) -> Result<PathBuf, ReportError> {
        let artifacts = ItemArtifacts::discover(dir, item)?;
        let doc = self.build_document(&artifacts, item)?;

        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_output(item));
        report::generate(&path, &doc)?;

        info!(item, path = %path.display(), segments = doc.segments.len(), "report generated");
        Ok(path)
    }

    /// [`generate`](Self::generate), logging the failure reason instead of
    /// returning it.
    pub fn generate_report(&self, dir: &Path, item: &str, output: Option<&Path>) -> bool {
        match self.generate(dir, item, output) {
            Ok(_) => true,
            Err(e) => {
                error!(item, error = %e, "report generation failed");
                false
            }
        }
    }

    /// Generate reports for `items` in parallel, each to its default path.
    ///
    /// `on_item` is called as each item finishes (from worker threads).
    pub fn generate_batch<F>(&self, dir: &Path, items: &[String], on_item: F) -> BatchOutcome
    where
        F: Fn(&ItemOutcome) + Sync + Send,
    {
        let items = items
            .par_iter()
            .map(|item| {
                let result = self.generate(dir, item, None);
                if let Err(ref e) = result {
                    error!(item = item.as_str(), error = %e, "report generation failed");
                }
                let outcome = ItemOutcome {
                    item: item.clone(),
                    result,
                };
                on_item(&outcome);
                outcome
            })
            .collect();

        BatchOutcome { items }
    }
}
