//! Inline image embedding
//!
//! Charts are stored as base64 `data:` URIs so the report stays a single
//! file that can be mailed around or opened offline.

use crate::error::ReportError;
use crate::model::EmbeddedImage;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use tracing::warn;

/// MIME type from the file extension; unknown extensions are assumed PNG.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

impl EmbeddedImage {
    pub fn from_bytes(mime_type: &'static str, bytes: &[u8]) -> Self {
        Self {
            mime_type,
            payload: STANDARD.encode(bytes),
        }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ReportError::from_read(path, e))?;
        Ok(Self::from_bytes(mime_type_for(path), &bytes))
    }

    /// Read an image, returning `None` (after logging) if it can't be read.
    pub fn load<P: AsRef<Path>>(path: P) -> Option<Self> {
        match Self::read(path) {
            Ok(img) => Some(img),
            Err(e) => {
                warn!(error = %e, "image not embedded");
                None
            }
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for(Path::new("a.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.gif")), "image/gif");
        assert_eq!(mime_type_for(Path::new("a.webp")), "image/png");
        assert_eq!(mime_type_for(Path::new("noext")), "image/png");
    }

    #[test]
    fn test_data_uri() {
        let img = EmbeddedImage::from_bytes("image/gif", b"GIF89a");
        assert_eq!(img.payload, "R0lGODlh");
        assert_eq!(img.data_uri(), "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn test_read_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.jpg");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let img = EmbeddedImage::read(&path).unwrap();
        assert_eq!(img.mime_type, "image/jpeg");
        assert_eq!(img.payload, "AQID");
    }

    #[test]
    fn test_load_missing_is_none() {
        assert!(EmbeddedImage::load("/no/such/cpu_usage.png").is_none());
    }
}
