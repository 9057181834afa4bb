//! transcript-report - Reports for an audio transcription pipeline
//!
//! Turns what a transcription run leaves on disk into deliverables for
//! the operator:
//!
//! - one self-contained HTML report per transcribed item (transcript,
//!   timed segments, resource metrics, embedded charts)
//! - PNG charts of the CPU, memory and energy monitoring logs
//! - a plain-text QoS summary for a whole session
//!
//! # Overview
//!
//! ```text
//! transcript .txt ─────────────────────┐
//! timed text .srt ── timed_text ───────┤
//! monitoring_*.csv ─ metrics ──────────┼──> ReportDocument ──> report::html
//!                  └ chart ─> *.png ─ embed ┘
//!
//! session JSON ──> SessionSummary ──> report::summary
//! ```
//!
//! Every input except the transcript is optional. Missing or broken
//! artifacts become `N/A` cards or omitted sections, never a failed
//! report.
//!
//! # Quick Start
//!
//! ```no_run
//! use transcript_report::{Orchestrator, ReportConfig};
//! use std::path::Path;
//!
//! let orchestrator = Orchestrator::new(
//!     ReportConfig::new()
//!         .with_output_dir("output/reports")
//!         .with_model("small"),
//! );
//!
//! match orchestrator.generate(Path::new("transcriptions"), "journal_20h", None) {
//!     Ok(path) => println!("Report: {}", path.display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```
//!
//! # QoS Objectives
//!
//! | Objective | Met when |
//! |-----------|----------|
//! | Throughput, small model | ≥ 5× real time |
//! | Throughput, medium model | ≥ 1× real time |
//! | Success rate | ≥ 99% of files |
//!
//! # Modules
//!
//! - [`orchestrator`]: artifact discovery and per-item report assembly
//! - [`timed_text`]: subtitle block parser
//! - [`metrics`]: CSV resource logs and the per-report figures
//! - [`chart`]: monitoring charts (SVG layout, PNG output)
//! - [`embed`]: base64 inline images
//! - [`report`]: HTML report and text summary renderers

pub mod chart;
pub mod embed;
pub mod error;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod timed_text;

pub use chart::{ChartKind, ChartRenderer};
pub use error::ReportError;
pub use model::{
    EmbeddedImage, MetricValue, MetricsSnapshot, ProcessingTiming, ReportDocument,
    ReportMetadata, Segment, SessionSummary, NOT_AVAILABLE,
};
pub use orchestrator::{BatchOutcome, ItemArtifacts, Orchestrator, ReportConfig};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is reachable from the crate
    // root.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let _ = Orchestrator::default();
        let _ = ChartRenderer::new();
        let _: MetricValue = MetricValue::NotAvailable;
        assert_eq!(NOT_AVAILABLE, "N/A");
    }

    #[test]
    fn test_orchestrator_builder() {
        let orchestrator = Orchestrator::new(ReportConfig::new().with_language("en"));
        assert_eq!(orchestrator.config.language, "en");
        assert_eq!(orchestrator.config.model, "small");
    }

    #[test]
    fn test_chart_kinds() {
        let files: Vec<_> = ChartKind::ALL.iter().map(|k| k.image_file()).collect();
        assert_eq!(files, vec!["cpu_usage.png", "memory_usage.png", "power_usage.png"]);
    }
}
