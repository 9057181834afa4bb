//! Error taxonomy shared by every stage of report assembly
//!
//! Component entry points return [`ReportError`]; the boundary wrappers
//! (`load`, `generate_report`, ...) log it and degrade instead of bubbling
//! it further.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A required file does not exist
    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),

    /// The file exists but could not be read or decoded
    #[error("unreadable input {}: {reason}", path.display())]
    UnreadableInput { path: PathBuf, reason: String },

    /// A resource log with a header but no data rows
    #[error("empty series: {}", .0.display())]
    EmptySeries(PathBuf),

    #[error("column {column} not found in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// Chart markup could not be rasterized
    #[error("render error: {0}")]
    Render(String),

    #[error("cannot write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Classify an I/O error raised while reading `path`.
    pub fn from_read(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ReportError::MissingInput(path.to_path_buf()),
            _ => ReportError::UnreadableInput {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }

    pub fn write_failure(path: &Path, source: std::io::Error) -> Self {
        ReportError::WriteFailure {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for "the file simply isn't there", which most callers treat as
    /// a normal layout rather than a problem worth a warning.
    pub fn is_missing(&self) -> bool {
        matches!(self, ReportError::MissingInput(_))
    }
}

/// Read a UTF-8 text file, mapping failures onto the taxonomy.
pub(crate) fn read_text(path: &Path) -> Result<String, ReportError> {
    let bytes = std::fs::read(path).map_err(|e| ReportError::from_read(path, e))?;
    String::from_utf8(bytes).map_err(|e| ReportError::UnreadableInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write `contents` to `path` so that the file is either complete or absent.
///
/// Data goes to a temp file in the destination directory and is renamed
/// into place only after a successful flush.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ReportError> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| ReportError::write_failure(path, e))?;

    let mut tmp =
        tempfile::NamedTempFile::new_in(&dir).map_err(|e| ReportError::write_failure(path, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.flush())
        .map_err(|e| ReportError::write_failure(path, e))?;
    tmp.persist(path)
        .map_err(|e| ReportError::write_failure(path, e.error))?;
    Ok(())
}
