//! SVG → PNG
//!
//! Chart markup is laid out at 100 units per inch and rasterized with
//! resvg at `dpi / 100` scale. The PNG records the DPI in its `pHYs`
//! chunk so print tools size it correctly.
//!
//! Font discovery is the slow part of a render, so callers load the
//! system fonts once with [`system_fonts`] and pass the shared database
//! to every call.

use crate::error::{write_atomic, ReportError};
use png::{BitDepth, ColorType, Encoder, PixelDimensions, Unit};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::fontdb::Database;
use resvg::usvg::{Options, Tree};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Layout units per inch in the chart markup.
const UNITS_PER_INCH: f32 = 100.0;

const METERS_PER_INCH: f32 = 0.0254;

/// Rasterized RGBA image.
#[derive(Debug)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    /// Straight (non-premultiplied) RGBA, row-major
    pub rgba: Vec<u8>,
}

/// Font database with the system fonts loaded.
pub fn system_fonts() -> Arc<Database> {
    let mut db = Database::new();
    db.load_system_fonts();
    debug!(faces = db.len(), "system fonts loaded");
    Arc::new(db)
}

pub fn rasterize(svg: &str, dpi: f32, fonts: &Arc<Database>) -> Result<Raster, ReportError> {
    let options = Options {
        fontdb: Arc::clone(fonts),
        ..Options::default()
    };

    let tree = Tree::from_str(svg, &options)
        .map_err(|e| ReportError::Render(format!("SVG parse failed: {e}")))?;

    let scale = dpi / UNITS_PER_INCH;
    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        ReportError::Render(format!("cannot allocate {width}x{height} pixmap"))
    })?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    Ok(Raster {
        width,
        height,
        rgba,
    })
}

pub fn encode_png(raster: &Raster, dpi: f32) -> Result<Vec<u8>, ReportError> {
    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, raster.width, raster.height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);

    let per_meter = (dpi / METERS_PER_INCH).round() as u32;
    encoder.set_pixel_dims(Some(PixelDimensions {
        xppu: per_meter,
        yppu: per_meter,
        unit: Unit::Meter,
    }));

    encoder
        .write_header()
        .and_then(|mut writer| {
            writer.write_image_data(&raster.rgba)?;
            writer.finish()
        })
        .map_err(|e| ReportError::Render(format!("PNG encoding failed: {e}")))?;

    Ok(out)
}

/// Rasterize `svg` and write it to `path`. No file is left behind on error.
pub fn write_png(
    svg: &str,
    path: &Path,
    dpi: f32,
    fonts: &Arc<Database>,
) -> Result<(), ReportError> {
    let raster = rasterize(svg, dpi, fonts)?;
    let bytes = encode_png(&raster, dpi)?;
    write_atomic(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_fonts() -> Arc<Database> {
        Arc::new(Database::new())
    }

    const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50"><rect width="100%" height="100%" fill="white"/><rect x="0" y="0" width="10" height="10" fill="red"/></svg>"#;

    #[test]
    fn test_rasterize_scales_by_dpi() {
        let raster = rasterize(SQUARE, 300.0, &no_fonts()).unwrap();

        assert_eq!((raster.width, raster.height), (300, 150));
        assert_eq!(raster.rgba.len(), 300 * 150 * 4);
        // Top-left pixel is inside the red square
        assert_eq!(&raster.rgba[..4], &[255, 0, 0, 255]);
        // Bottom-right pixel is white background
        assert_eq!(&raster.rgba[raster.rgba.len() - 4..], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_png_records_dpi() {
        let raster = rasterize(SQUARE, 300.0, &no_fonts()).unwrap();
        let bytes = encode_png(&raster, 300.0).unwrap();

        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        let info = reader.info();

        assert_eq!((info.width, info.height), (300, 150));
        let dims = info.pixel_dims.unwrap();
        assert_eq!(dims.xppu, 11811);
        assert_eq!(dims.unit, Unit::Meter);
    }

    #[test]
    fn test_invalid_svg_is_render_error() {
        let err = rasterize("<not svg", 300.0, &no_fonts()).unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
    }

    #[test]
    fn test_write_png_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");

        assert!(write_png("garbage", &path, 100.0, &no_fonts()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_fonts_are_shared_not_copied() {
        let fonts = no_fonts();
        let first = rasterize(SQUARE, 100.0, &fonts).unwrap();
        let second = rasterize(SQUARE, 100.0, &fonts).unwrap();

        assert_eq!(first.rgba, second.rgba);
        // Only our handle is left once the renders are done
        assert_eq!(Arc::strong_count(&fonts), 1);
    }
}
