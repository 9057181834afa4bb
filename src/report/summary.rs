//! Plain-text QoS summary for a processing session
//!
//! Fixed 80-column layout with `=`/`-` rules. Figures come straight from
//! [`SessionSummary`]; the only logic here is the two objective checks.

use crate::error::{read_text, write_atomic, ReportError};
use crate::model::SessionSummary;
use std::fmt::{self, Write as _};
use std::path::Path;
use tracing::info;

const WIDTH: usize = 80;

/// Throughput needed by the small model class
pub const FAST_TIER_THROUGHPUT: f64 = 5.0;
/// Real-time, the floor for the medium model class
pub const SLOW_TIER_THROUGHPUT: f64 = 1.0;
pub const SUCCESS_RATE_TARGET: f64 = 0.99;

/// Throughput check. Tiers are tried fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThroughputObjective {
    FastTier,
    SlowTier,
    NotMet,
}

impl ThroughputObjective {
    pub fn evaluate(throughput: f64) -> Self {
        if throughput >= FAST_TIER_THROUGHPUT {
            ThroughputObjective::FastTier
        } else if throughput >= SLOW_TIER_THROUGHPUT {
            ThroughputObjective::SlowTier
        } else {
            ThroughputObjective::NotMet
        }
    }

    pub fn is_met(self) -> bool {
        self != ThroughputObjective::NotMet
    }

    pub fn line(self) -> &'static str {
        match self {
            ThroughputObjective::FastTier => "✓ Throughput ≥ 5× (modèle small) : ATTEINT",
            ThroughputObjective::SlowTier => "✓ Throughput ≥ 1× (modèle medium) : ATTEINT",
            ThroughputObjective::NotMet => "✗ Throughput insuffisant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuccessObjective {
    Met,
    /// Carries the actual rate (fraction) for reporting
    NotMet(f64),
}

impl SuccessObjective {
    pub fn evaluate(rate: f64) -> Self {
        if rate >= SUCCESS_RATE_TARGET {
            SuccessObjective::Met
        } else {
            SuccessObjective::NotMet(rate)
        }
    }

    pub fn is_met(self) -> bool {
        self == SuccessObjective::Met
    }

    pub fn line(self) -> String {
        match self {
            SuccessObjective::Met => "✓ Taux de réussite ≥ 99% : ATTEINT".to_string(),
            SuccessObjective::NotMet(rate) => {
                format!("⚠ Taux de réussite {:.1}% < 99%", rate * 100.0)
            }
        }
    }
}

pub fn render(summary: &SessionSummary) -> String {
    let mut out = String::with_capacity(2048);
    // fmt::Write for String is infallible
    let _ = render_into(&mut out, summary);
    out
}

fn render_into(out: &mut String, summary: &SessionSummary) -> fmt::Result {
    let heavy = "=".repeat(WIDTH);
    let light = "-".repeat(WIDTH);

    writeln!(out, "{heavy}")?;
    writeln!(out, "RAPPORT QoS - STATION TV - TRANSCRIPTION AUDIO")?;
    writeln!(out, "{heavy}")?;
    writeln!(out)?;

    writeln!(out, "RÉSUMÉ DE LA SESSION")?;
    writeln!(out, "{light}")?;
    writeln!(out, "Durée de la session: {:.2} heures", summary.session_duration_hours)?;
    writeln!(out, "Nombre total de fichiers: {}", summary.total_files)?;
    writeln!(out, "Fichiers réussis: {}", summary.successful_files)?;
    writeln!(out, "Fichiers échoués: {}", summary.failed_files)?;
    writeln!(out, "Taux de réussite: {:.1}%", summary.success_rate * 100.0)?;
    writeln!(out)?;

    writeln!(out, "PERFORMANCE")?;
    writeln!(out, "{light}")?;
    writeln!(out, "Durée audio totale traitée: {:.2} heures", summary.total_audio_duration_hours)?;
    writeln!(out, "Temps de traitement total: {:.2} heures", summary.total_processing_time_hours)?;
    writeln!(out, "Throughput (débit): {:.2}× temps réel", summary.throughput)?;
    writeln!(out, "Temps moyen par fichier: {:.2} secondes", summary.average_processing_time_seconds)?;
    writeln!(out)?;

    writeln!(out, "OBJECTIFS QoS")?;
    writeln!(out, "{light}")?;
    writeln!(out, "{}", ThroughputObjective::evaluate(summary.throughput).line())?;
    writeln!(out, "{}", SuccessObjective::evaluate(summary.success_rate).line())?;
    writeln!(out)?;
    writeln!(out, "{heavy}")
}

/// Render and write the summary, creating the parent directory if needed.
pub fn write_summary<P: AsRef<Path>>(path: P, summary: &SessionSummary) -> Result<(), ReportError> {
    let path = path.as_ref();
    write_atomic(path, render(summary).as_bytes())?;
    info!(path = %path.display(), "summary report written");
    Ok(())
}

impl SessionSummary {
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let text = read_text(path)?;
        serde_json::from_str(&text).map_err(|e| ReportError::UnreadableInput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_summary() -> SessionSummary {
        SessionSummary {
            total_files: 100,
            successful_files: 99,
            failed_files: 1,
            success_rate: 0.99,
            session_duration_hours: 2.5,
            total_audio_duration_hours: 15.0,
            total_processing_time_hours: 2.25,
            throughput: 6.666,
            average_processing_time_seconds: 81.0,
        }
    }

    // ==========================================================================
    // OBJECTIVE EVALUATION TESTS
    // ==========================================================================
    //
    // Throughput tiers are checked top-down, first match wins. Success rate
    // is evaluated independently and both lines are always printed.
    // ==========================================================================

    #[test]
    fn test_throughput_tiers() {
        let cases = [
            (0.5, ThroughputObjective::NotMet),
            (1.0, ThroughputObjective::SlowTier),
            (4.9, ThroughputObjective::SlowTier),
            (5.0, ThroughputObjective::FastTier),
            (7.0, ThroughputObjective::FastTier),
        ];
        for (throughput, expected) in cases {
            assert_eq!(ThroughputObjective::evaluate(throughput), expected, "throughput {throughput}");
        }
    }

    #[test]
    fn test_throughput_met() {
        assert!(ThroughputObjective::FastTier.is_met());
        assert!(ThroughputObjective::SlowTier.is_met());
        assert!(!ThroughputObjective::NotMet.is_met());
    }

    #[test]
    fn test_success_rate_boundary() {
        assert!(SuccessObjective::evaluate(0.99).is_met());
        assert!(SuccessObjective::evaluate(1.0).is_met());
        assert_eq!(SuccessObjective::evaluate(0.95), SuccessObjective::NotMet(0.95));
    }

    #[test]
    fn test_success_not_met_reports_percentage() {
        assert_eq!(SuccessObjective::NotMet(0.95).line(), "⚠ Taux de réussite 95.0% < 99%");
    }

    // ==========================================================================
    // LAYOUT TESTS
    // ==========================================================================

    #[test]
    fn test_render_sections_in_order() {
        let text = render(&test_summary());

        let session = text.find("RÉSUMÉ DE LA SESSION").unwrap();
        let perf = text.find("PERFORMANCE").unwrap();
        let qos = text.find("OBJECTIFS QoS").unwrap();
        assert!(session < perf && perf < qos);
    }

    #[test]
    fn test_render_figures() {
        let text = render(&test_summary());

        assert!(text.contains("Durée de la session: 2.50 heures\n"));
        assert!(text.contains("Nombre total de fichiers: 100\n"));
        assert!(text.contains("Fichiers échoués: 1\n"));
        assert!(text.contains("Taux de réussite: 99.0%\n"));
        assert!(text.contains("Throughput (débit): 6.67× temps réel\n"));
        assert!(text.contains("Temps moyen par fichier: 81.00 secondes\n"));
        assert!(text.contains("✓ Throughput ≥ 5× (modèle small) : ATTEINT\n"));
        assert!(text.contains("✓ Taux de réussite ≥ 99% : ATTEINT\n"));
    }

    #[test]
    fn test_render_both_objectives_failing() {
        let summary = SessionSummary {
            throughput: 0.4,
            success_rate: 0.5,
            ..test_summary()
        };
        let text = render(&summary);

        assert!(text.contains("✗ Throughput insuffisant\n"));
        assert!(text.contains("⚠ Taux de réussite 50.0% < 99%\n"));
    }

    #[test]
    fn test_render_borders() {
        let text = render(&SessionSummary::default());
        let rule = "=".repeat(80);

        assert!(text.starts_with(&format!("{rule}\n")));
        assert!(text.ends_with(&format!("\n{rule}\n")));
        assert_eq!(text.matches(&"-".repeat(80)).count(), 3);
    }

    // ==========================================================================
    // FILE I/O TESTS
    // ==========================================================================

    #[test]
    fn test_write_summary_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/nested/summary_report.txt");

        write_summary(&path, &test_summary()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render(&test_summary()));
    }

    #[test]
    fn test_read_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"total_files": 3, "success_rate": 1.0, "throughput": 2.0}"#).unwrap();

        let summary = SessionSummary::read_json(&path).unwrap();
        assert_eq!(summary.total_files, 3);
        assert_eq!(ThroughputObjective::evaluate(summary.throughput), ThroughputObjective::SlowTier);
    }

    #[test]
    fn test_read_json_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = SessionSummary::read_json(&path).unwrap_err();
        assert!(matches!(err, ReportError::UnreadableInput { .. }));
    }

    #[test]
    fn test_read_json_missing() {
        let err = SessionSummary::read_json("/no/such/session.json").unwrap_err();
        assert!(err.is_missing());
    }
}
