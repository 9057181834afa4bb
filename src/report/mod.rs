//! Report output
//!
//! - **HTML**: self-contained per-item page ([`html`])
//! - **JSON**: the same [`ReportDocument`] serialized, for tooling
//! - **Text**: session QoS summary ([`summary`])
//!
//! # Usage
//!
//! ```ignore
//! use transcript_report::report;
//!
//! // Format picked from the extension
//! report::generate("out/journal_report.html", &doc)?;
//! report::generate("out/journal_report.json", &doc)?;
//! ```

pub mod html;
pub mod summary;

use crate::error::{write_atomic, ReportError};
use crate::model::ReportDocument;
use chrono::Local;
use std::path::Path;
use tracing::info;

/// Write `doc` to `path` as HTML, or as JSON when the extension is `.json`.
///
/// The file is either fully written or not created.
pub fn generate<P: AsRef<Path>>(path: P, doc: &ReportDocument) -> Result<(), ReportError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let bytes = match ext.as_str() {
        "json" => serde_json::to_vec_pretty(doc).map_err(|e| ReportError::Render(e.to_string()))?,
        _ => {
            let mut buf = Vec::with_capacity(32 * 1024 + doc.transcription.len());
            let generated_at = html::generated_timestamp(&Local::now());
            html::write(&mut buf, doc, &generated_at)
                .map_err(|e| ReportError::Render(e.to_string()))?;
            buf
        }
    };

    write_atomic(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "report written");
    Ok(())
}
