//! Immutable full-buffer captures and their persistence encoding.
//!
//! A [`Snapshot`] stores the premultiplied RGBA8 pixels of the surface in
//! shared storage, so cloning one for the undo stack is cheap. The blob format
//! is a plain RGBA8 PNG with straight alpha; converting premultiplied pixels to
//! straight alpha and back with round-half-up integer arithmetic is lossless,
//! so a blob always restores the exact buffer it was made from.

use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

/// Snapshot encoding and decoding errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
    #[error("Failed to decode snapshot: {0}")]
    Decode(String),
    #[error("Unsupported snapshot layout: {0}")]
    Unsupported(String),
    #[error("Invalid snapshot dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// An immutable capture of the entire pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    /// Premultiplied RGBA8, row-major.
    pixels: Arc<[u8]>,
}

impl Snapshot {
    /// Capture a pixmap.
    pub fn from_pixmap(pixmap: &tiny_skia::Pixmap) -> Self {
        Self {
            width: pixmap.width(),
            height: pixmap.height(),
            pixels: Arc::from(pixmap.data()),
        }
    }

    /// Build from premultiplied RGBA8 data.
    pub fn from_premultiplied(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, SnapshotError> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize * 4 {
            return Err(SnapshotError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::from(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether both snapshots share the same pixel storage.
    pub fn shares_storage(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Convert back into an owned pixmap.
    pub fn to_pixmap(&self) -> Option<tiny_skia::Pixmap> {
        let size = tiny_skia::IntSize::from_wh(self.width, self.height)?;
        tiny_skia::Pixmap::from_vec(self.pixels.to_vec(), size)
    }

    /// Encode as an RGBA8 PNG with straight alpha.
    pub fn to_png(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut straight = self.pixels.to_vec();
        for px in straight.chunks_exact_mut(4) {
            let a = px[3];
            px[0] = demultiply(px[0], a);
            px[1] = demultiply(px[1], a);
            px[2] = demultiply(px[2], a);
        }

        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| SnapshotError::Encode(e.to_string()))?;
            writer
                .write_image_data(&straight)
                .map_err(|e| SnapshotError::Encode(e.to_string()))?;
        }
        Ok(out)
    }

    /// Decode a blob produced by [`Snapshot::to_png`].
    ///
    /// Only 8-bit RGBA PNGs are accepted; anything else is reported instead of
    /// being reinterpreted.
    pub fn from_png(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let decoder = png::Decoder::new(Cursor::new(bytes));
        let mut reader = decoder
            .read_info()
            .map_err(|e| SnapshotError::Decode(e.to_string()))?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| SnapshotError::Decode(e.to_string()))?;

        if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
            return Err(SnapshotError::Unsupported(format!(
                "{:?} at {:?}",
                info.color_type, info.bit_depth
            )));
        }
        buf.truncate(info.buffer_size());

        for px in buf.chunks_exact_mut(4) {
            let a = px[3];
            px[0] = premultiply(px[0], a);
            px[1] = premultiply(px[1], a);
            px[2] = premultiply(px[2], a);
        }
        Self::from_premultiplied(info.width, info.height, buf)
    }
}

/// Straight-alpha channel to premultiplied, rounding half up.
pub(crate) fn premultiply(c: u8, a: u8) -> u8 {
    ((c as u32 * a as u32 + 127) / 255) as u8
}

/// Premultiplied channel to straight alpha, rounding half up.
pub(crate) fn demultiply(c: u8, a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    let a = a as u32;
    ((c as u32 * 255 + a / 2) / a).min(255) as u8
}
