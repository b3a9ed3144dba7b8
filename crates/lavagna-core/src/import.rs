//! Image and PDF page import.
//!
//! Decoding happens here; placement and compositing happen on the canvas.
//! PDF rasterization is left to the host through [`PageRenderer`].

use crate::snapshot::premultiply;
use kurbo::{Point, Rect, Size};
use thiserror::Error;

/// Fraction of the board an imported image may cover.
pub const IMAGE_FIT_RATIO: f64 = 0.8;

/// Fraction of the board an imported PDF page may cover.
pub const PDF_FIT_RATIO: f64 = 0.9;

/// Import errors, reported back to the host.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Page {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: u32 },
    #[error("Failed to render page {page}: {reason}")]
    PageRender { page: u32, reason: String },
    #[error("Image has no pixels")]
    Empty,
}

/// Image format for imported data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }

    fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

/// A ready-to-composite raster image.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixmap: tiny_skia::Pixmap,
}

impl Bitmap {
    /// Build from straight-alpha RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Result<Self, ImportError> {
        if width == 0 || height == 0 {
            return Err(ImportError::Empty);
        }
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(ImportError::Decode(format!(
                "expected {} bytes for {}x{}, got {}",
                width as usize * height as usize * 4,
                width,
                height,
                rgba.len()
            )));
        }
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| ImportError::Decode(format!("{}x{} is too large", width, height)))?;
        for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(rgba.chunks_exact(4)) {
            let a = src[3];
            dst[0] = premultiply(src[0], a);
            dst[1] = premultiply(src[1], a);
            dst[2] = premultiply(src[2], a);
            dst[3] = a;
        }
        Ok(Self { pixmap })
    }

    /// A bitmap filled with one color.
    pub fn solid(width: u32, height: u32, color: crate::InkColor) -> Result<Self, ImportError> {
        let pixel = [color.r, color.g, color.b, color.a];
        let rgba: Vec<u8> = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::from_rgba8(width, height, &rgba)
    }

    pub fn from_pixmap(pixmap: tiny_skia::Pixmap) -> Self {
        Self { pixmap }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }

    pub(crate) fn pixmap(&self) -> &tiny_skia::Pixmap {
        &self.pixmap
    }
}

/// Decode PNG, JPEG or WebP data. Anything else is rejected untouched.
pub fn decode_image(bytes: &[u8]) -> Result<Bitmap, ImportError> {
    let format = ImageFormat::from_magic_bytes(bytes).ok_or(ImportError::UnsupportedFormat)?;
    let decoded = image::load_from_memory_with_format(bytes, format.to_image_format())
        .map_err(|e| ImportError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    log::info!(
        "Decoded {} image ({}x{})",
        format.mime_type(),
        rgba.width(),
        rgba.height()
    );
    Bitmap::from_rgba8(rgba.width(), rgba.height(), rgba.as_raw())
}

/// Scale `source` to fit `ratio` of `target`, preserving aspect ratio, and
/// center it on `target`.
pub fn fit_centered(source: Size, target: Size, ratio: f64) -> Rect {
    fit_at(
        source,
        target,
        ratio,
        Point::new(target.width / 2.0, target.height / 2.0),
    )
}

/// Same scale as [`fit_centered`], centered on `center` instead. The result
/// may extend past `target`.
pub fn fit_at(source: Size, target: Size, ratio: f64, center: Point) -> Rect {
    if source.width <= 0.0 || source.height <= 0.0 {
        return Rect::from_center_size(center, Size::ZERO);
    }
    let scale = (target.width / source.width).min(target.height / source.height) * ratio;
    Rect::from_center_size(center, Size::new(source.width * scale, source.height * scale))
}

/// Rasterizes pages of an external document (PDF).
pub trait PageRenderer {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Render a 1-based page to a bitmap.
    fn render_page(&self, page: u32) -> Result<Bitmap, ImportError>;
}

/// Validate the page number and render it.
pub fn render_pdf_page(renderer: &dyn PageRenderer, page: u32) -> Result<Bitmap, ImportError> {
    let count = renderer.page_count();
    if page == 0 || page > count {
        return Err(ImportError::PageOutOfRange { page, count });
    }
    renderer.render_page(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InkColor;

    fn png_bytes(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(rgba).unwrap();
        }
        out
    }

    struct FakePdf {
        pages: u32,
    }

    impl PageRenderer for FakePdf {
        fn page_count(&self) -> u32 {
            self.pages
        }

        fn render_page(&self, _page: u32) -> Result<Bitmap, ImportError> {
            Bitmap::solid(4, 6, InkColor::white())
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_extension("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_extension("gif"), None);
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D]),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), None);
    }

    #[test]
    fn test_decode_png() {
        let rgba = [255, 0, 0, 255, 0, 0, 255, 128];
        let bitmap = decode_image(&png_bytes(2, 1, &rgba)).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (2, 1));
        let px = bitmap.pixmap().pixel(1, 0).unwrap();
        assert_eq!(px.alpha(), 128);
        assert_eq!(px.blue(), premultiply(255, 128));
    }

    #[test]
    fn test_decode_rejects_unknown_content() {
        let result = decode_image(b"%PDF-1.7 not an image");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat)));
    }

    #[test]
    fn test_decode_reports_truncated_png() {
        let mut bytes = png_bytes(4, 4, &[7; 64]);
        bytes.truncate(20);
        assert!(matches!(decode_image(&bytes), Err(ImportError::Decode(_))));
    }

    #[test]
    fn test_fit_centered() {
        let rect = fit_centered(Size::new(1000.0, 500.0), Size::new(400.0, 400.0), 1.0);
        assert!((rect.width() - 400.0).abs() < 1e-9);
        assert!((rect.height() - 200.0).abs() < 1e-9);
        assert!((rect.y0 - 100.0).abs() < 1e-9);

        let rect = fit_centered(Size::new(100.0, 100.0), Size::new(200.0, 100.0), IMAGE_FIT_RATIO);
        assert!((rect.width() - 80.0).abs() < 1e-9);
        assert!((rect.center().x - 100.0).abs() < 1e-9);
        assert!((rect.center().y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_at_drop_point() {
        let target = Size::new(200.0, 100.0);
        let rect = fit_at(Size::new(100.0, 100.0), target, IMAGE_FIT_RATIO, Point::new(20.0, 30.0));
        assert_eq!(rect.center(), Point::new(20.0, 30.0));
        assert!((rect.width() - 80.0).abs() < 1e-9);
        // Allowed to hang off the board, as a dropped image does.
        assert!(rect.x0 < 0.0);
    }

    #[test]
    fn test_pdf_page_range() {
        let pdf = FakePdf { pages: 3 };
        assert!(render_pdf_page(&pdf, 2).is_ok());
        assert!(matches!(
            render_pdf_page(&pdf, 0),
            Err(ImportError::PageOutOfRange { page: 0, count: 3 })
        ));
        assert!(matches!(
            render_pdf_page(&pdf, 4),
            Err(ImportError::PageOutOfRange { page: 4, count: 3 })
        ));
    }

    #[test]
    fn test_bitmap_size_mismatch() {
        assert!(matches!(Bitmap::from_rgba8(2, 2, &[0; 4]), Err(ImportError::Decode(_))));
        assert!(matches!(Bitmap::from_rgba8(0, 2, &[]), Err(ImportError::Empty)));
    }
}
