//! The raster drawing surface.
//!
//! [`Surface`] owns the canonical pixel buffer plus a transient overlay used
//! for previews. Every operation is total: coordinates are sanitized and
//! clamped instead of rejected.

use crate::color::InkColor;
use crate::import::Bitmap;
use crate::snapshot::{Snapshot, premultiply};
use crate::tools::{LineCap, RenderParams};
use kurbo::{Point, Rect, Size};
use std::sync::Arc;
use swash::FontRef;
use swash::scale::{Render, ScaleContext, Source};
use swash::shape::ShapeContext;
use swash::zeno::Format;
use thiserror::Error;
use tiny_skia::{BlendMode, Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Transform};

/// Largest accepted width or height.
pub const MAX_DIMENSION: u32 = 8192;

/// Font loading errors.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Unreadable font data")]
    Invalid,
}

/// A stroke between `begin_stroke` and `end_stroke`.
#[derive(Debug)]
struct OpenStroke {
    /// Buffer content before the stroke started.
    base: Pixmap,
    points: Vec<Point>,
    params: RenderParams,
}

impl OpenStroke {
    /// Pixels a new segment `from`..`to` can change, joins and miters included.
    fn dirty_rect(&self, from: Point, to: Point) -> Rect {
        let margin = self.params.line_width.max(0.0) * 2.0 + 2.0;
        Rect::from_points(from, to).inflate(margin, margin)
    }
}

/// Pixel buffer with draw primitives and snapshot support.
pub struct Surface {
    pixmap: Pixmap,
    overlay: Pixmap,
    stroke: Option<OpenStroke>,
    font: Option<Arc<[u8]>>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("stroking", &self.stroke.is_some())
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl Surface {
    /// Create a transparent surface. Dimensions are clamped to `1..=MAX_DIMENSION`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: blank_pixmap(width, height),
            overlay: blank_pixmap(width, height),
            stroke: None,
            font: None,
        }
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

    /// The committed buffer.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// The preview layer. Never part of a snapshot.
    pub fn overlay(&self) -> &Pixmap {
        &self.overlay
    }

    /// Map any point into the buffer; NaN coordinates become 0.
    pub fn clamp_point(&self, point: Point) -> Point {
        clamp_to(point, self.size())
    }

    /// Alpha of the pixel at `(x, y)`, 0 outside the buffer.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixmap.pixel(x, y).map(|px| px.alpha()).unwrap_or(0)
    }

    /// Load the font used by [`Surface::stamp_text`].
    pub fn set_font(&mut self, data: Vec<u8>) -> Result<(), FontError> {
        FontRef::from_index(&data, 0).ok_or(FontError::Invalid)?;
        self.font = Some(Arc::from(data));
        Ok(())
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Reallocate the buffer, keeping content anchored at the top-left corner.
    ///
    /// An open stroke is closed first; its pixels stay.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.end_stroke();
        let mut pixmap = blank_pixmap(width, height);
        blit_top_left(
            &mut pixmap,
            self.pixmap.data(),
            self.pixmap.width(),
            self.pixmap.height(),
        );
        self.overlay = blank_pixmap(pixmap.width(), pixmap.height());
        self.pixmap = pixmap;
    }

    /// Open a stroke at `point`. An already open stroke is closed first.
    pub fn begin_stroke(&mut self, point: Point, params: RenderParams) {
        self.end_stroke();
        let point = self.clamp_point(point);
        let stroke = OpenStroke {
            base: self.pixmap.clone(),
            points: vec![point],
            params,
        };
        // A tap leaves a dot.
        let dirty = stroke.dirty_rect(point, point);
        render_stroke_region(&mut self.pixmap, &stroke, dirty);
        self.stroke = Some(stroke);
    }

    /// Append a segment to the open stroke and composite it immediately.
    ///
    /// The whole path is re-rendered over the pre-stroke buffer, so
    /// translucent tools keep a uniform opacity across segment joins. Only
    /// the pixels around the new segment are touched.
    /// Returns `false` when no stroke is open.
    pub fn extend_stroke(&mut self, point: Point) -> bool {
        let point = self.clamp_point(point);
        let Some(stroke) = self.stroke.as_mut() else {
            return false;
        };
        let last = stroke.points.last().copied().unwrap_or(point);
        stroke.points.push(point);
        let dirty = stroke.dirty_rect(last, point);
        render_stroke_region(&mut self.pixmap, stroke, dirty);
        true
    }

    /// Close the open stroke. Pixels are already final.
    /// Returns `false` when no stroke was open.
    pub fn end_stroke(&mut self) -> bool {
        self.stroke.take().is_some()
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Draw a single straight segment.
    pub fn draw_line(&mut self, from: Point, to: Point, params: &RenderParams) {
        let points = [self.clamp_point(from), self.clamp_point(to)];
        if let Some(path) = polyline(&points) {
            self.pixmap.stroke_path(
                &path,
                &params.skia_paint(),
                &params.skia_stroke(),
                Transform::identity(),
                None,
            );
        }
    }

    /// Remove pixels inside a circle.
    pub fn erase(&mut self, point: Point, radius: f64) {
        if !radius.is_finite() || radius <= 0.0 {
            return;
        }
        let center = self.clamp_point(point);
        let Some(circle) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32)
        else {
            return;
        };
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color(Color::BLACK);
        paint.blend_mode = BlendMode::DestinationOut;
        self.pixmap
            .fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);
    }

    /// Draw `text` with its first line's top-left corner at `point`.
    ///
    /// The font size is `params.line_width`. Returns `false` when nothing could
    /// be drawn (no font loaded, empty text).
    pub fn stamp_text(&mut self, point: Point, text: &str, params: &RenderParams) -> bool {
        let Some(data) = self.font.clone() else {
            log::warn!("Text stamp skipped: no font loaded");
            return false;
        };
        let Some(font) = FontRef::from_index(&data, 0) else {
            return false;
        };
        let origin = self.clamp_point(point);
        let size = params.line_width as f32;
        let metrics = font.metrics(&[]).scale(size);
        let line_height = metrics.ascent + metrics.descent + metrics.leading;
        let ink_alpha = premultiply(params.color.a, (params.alpha.clamp(0.0, 1.0) * 255.0).round() as u8);

        let mut shape_cx = ShapeContext::new();
        let mut scale_cx = ScaleContext::new();
        let mut scaler = scale_cx.builder(font).size(size).hint(false).build();
        let mut drawn = false;

        for (index, line) in text.lines().enumerate() {
            let baseline = origin.y as f32 + metrics.ascent + index as f32 * line_height;
            let mut pen_x = origin.x as f32;
            let mut glyphs = Vec::new();

            let mut shaper = shape_cx.builder(font).size(size).build();
            shaper.add_str(line);
            shaper.shape_with(|cluster| {
                for glyph in cluster.glyphs {
                    glyphs.push((glyph.id, pen_x + glyph.x, baseline - glyph.y));
                    pen_x += glyph.advance;
                }
            });

            for (id, x, y) in glyphs {
                let Some(mask) = Render::new(&[Source::Outline])
                    .format(Format::Alpha)
                    .render(&mut scaler, id)
                else {
                    continue;
                };
                let placement = mask.placement;
                let Some(glyph) = tint_mask(
                    &mask.data,
                    placement.width,
                    placement.height,
                    params.color,
                    ink_alpha,
                ) else {
                    continue;
                };
                self.pixmap.draw_pixmap(
                    x.round() as i32 + placement.left,
                    y.round() as i32 - placement.top,
                    glyph.as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
                drawn = true;
            }
        }
        drawn
    }

    /// Reset the whole buffer to transparent.
    pub fn clear_all(&mut self) {
        self.stroke = None;
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Reset the pixels covered by `rect` (expanded to whole pixels) to transparent.
    pub fn clear_rect(&mut self, rect: Rect) {
        let Some((x0, y0, x1, y1)) = pixel_bounds(rect, self.width(), self.height()) else {
            return;
        };
        let stride = self.width() as usize * 4;
        let data = self.pixmap.data_mut();
        for y in y0..y1 {
            let row = y as usize * stride;
            data[row + x0 as usize * 4..row + x1 as usize * 4].fill(0);
        }
    }

    /// Composite `bitmap` scaled into `rect`. Returns `false` for degenerate rects.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, rect: Rect) -> bool {
        self.composite_bitmap(bitmap, rect, BlendMode::SourceOver)
    }

    /// Like [`Surface::draw_bitmap`], but existing pixels stay on top.
    pub fn draw_bitmap_beneath(&mut self, bitmap: &Bitmap, rect: Rect) -> bool {
        self.composite_bitmap(bitmap, rect, BlendMode::DestinationOver)
    }

    fn composite_bitmap(&mut self, bitmap: &Bitmap, rect: Rect, blend_mode: BlendMode) -> bool {
        let finite = [rect.x0, rect.y0, rect.x1, rect.y1].iter().all(|v| v.is_finite());
        if !finite || rect.width() <= 0.0 || rect.height() <= 0.0 {
            return false;
        }
        let sx = rect.width() / bitmap.width() as f64;
        let sy = rect.height() / bitmap.height() as f64;
        let transform = Transform::from_row(
            sx as f32,
            0.0,
            0.0,
            sy as f32,
            rect.x0 as f32,
            rect.y0 as f32,
        );
        let paint = PixmapPaint {
            quality: tiny_skia::FilterQuality::Bilinear,
            blend_mode,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, bitmap.pixmap().as_ref(), &paint, transform, None);
        true
    }

    pub fn capture_snapshot(&self) -> Snapshot {
        Snapshot::from_pixmap(&self.pixmap)
    }

    /// Replace the buffer with a snapshot.
    ///
    /// A snapshot recorded at other dimensions is placed at (0,0) unscaled:
    /// parts outside the buffer are clipped and uncovered area becomes
    /// transparent. The buffer keeps its current dimensions.
    pub fn restore_snapshot(&mut self, snapshot: &Snapshot) {
        self.stroke = None;
        if snapshot.width() == self.width() && snapshot.height() == self.height() {
            self.pixmap.data_mut().copy_from_slice(snapshot.pixels());
            return;
        }
        log::warn!(
            "Restoring {}x{} snapshot into {}x{} surface",
            snapshot.width(),
            snapshot.height(),
            self.width(),
            self.height()
        );
        blit_top_left(
            &mut self.pixmap,
            snapshot.pixels(),
            snapshot.width(),
            snapshot.height(),
        );
    }

    /// Replace the overlay with a polyline.
    pub fn draw_overlay_polyline(&mut self, points: &[Point], color: InkColor, dashed: bool) {
        self.overlay.fill(Color::TRANSPARENT);
        let points: Vec<Point> = points.iter().map(|&p| self.clamp_point(p)).collect();
        let Some(path) = polyline(&points) else {
            return;
        };
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color(color.to_skia(1.0));
        let stroke = tiny_skia::Stroke {
            width: 1.5,
            dash: if dashed {
                tiny_skia::StrokeDash::new(vec![6.0, 4.0], 0.0)
            } else {
                None
            },
            ..tiny_skia::Stroke::default()
        };
        self.overlay
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Replace the overlay with a stroke segment drawn with `params`.
    pub fn draw_overlay_line(&mut self, from: Point, to: Point, params: &RenderParams) {
        self.overlay.fill(Color::TRANSPARENT);
        let points = [self.clamp_point(from), self.clamp_point(to)];
        if let Some(path) = polyline(&points) {
            self.overlay.stroke_path(
                &path,
                &params.skia_paint(),
                &params.skia_stroke(),
                Transform::identity(),
                None,
            );
        }
    }

    pub fn clear_overlay(&mut self) {
        self.overlay.fill(Color::TRANSPARENT);
    }

    /// Whether any overlay pixel is visible.
    pub fn overlay_is_empty(&self) -> bool {
        self.overlay.pixels().iter().all(|px| px.alpha() == 0)
    }
}

/// Clamp dimensions into the range the rasterizer accepts.
pub fn clamp_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width.clamp(1, MAX_DIMENSION), height.clamp(1, MAX_DIMENSION))
}

pub(crate) fn clamp_to(point: Point, size: Size) -> Point {
    let axis = |v: f64, max: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, max) };
    Point::new(axis(point.x, size.width), axis(point.y, size.height))
}

fn blank_pixmap(width: u32, height: u32) -> Pixmap {
    let (width, height) = clamp_dimensions(width, height);
    Pixmap::new(width, height).expect("clamped dimensions are always allocatable")
}

/// Copy `src` into `dst` at (0,0), clipping; the rest of `dst` is cleared.
fn blit_top_left(dst: &mut Pixmap, src: &[u8], src_width: u32, src_height: u32) {
    dst.fill(Color::TRANSPARENT);
    let dst_stride = dst.width() as usize * 4;
    let src_stride = src_width as usize * 4;
    let row_len = dst_stride.min(src_stride);
    let rows = dst.height().min(src_height) as usize;
    let data = dst.data_mut();
    for row in 0..rows {
        let d = row * dst_stride;
        let s = row * src_stride;
        data[d..d + row_len].copy_from_slice(&src[s..s + row_len]);
    }
}

/// Integer pixel range covered by `rect`, clipped to the buffer.
fn pixel_bounds(rect: Rect, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let size = Size::new(width as f64, height as f64);
    let rect = rect.abs();
    let min = clamp_to(Point::new(rect.x0, rect.y0), size);
    let max = clamp_to(Point::new(rect.x1, rect.y1), size);
    let (x0, y0) = (min.x.floor() as u32, min.y.floor() as u32);
    let (x1, y1) = (max.x.ceil() as u32, max.y.ceil() as u32);
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

/// Redraw `stroke` inside `dirty`: restore the pre-stroke pixels there, then
/// rasterize the whole path into a tile of that size and copy it back.
fn render_stroke_region(pixmap: &mut Pixmap, stroke: &OpenStroke, dirty: Rect) {
    let Some((x0, y0, x1, y1)) = pixel_bounds(dirty, pixmap.width(), pixmap.height()) else {
        return;
    };
    let Some(mut tile) = Pixmap::new(x1 - x0, y1 - y0) else {
        return;
    };
    let size = (tile.width(), tile.height());
    copy_block(&mut tile, (0, 0), &stroke.base, (x0, y0), size);

    let transform = Transform::from_translate(-(x0 as f32), -(y0 as f32));
    let paint = stroke.params.skia_paint();
    if let [point] = stroke.points.as_slice() {
        if let Some(dot) = dot_path(*point, &stroke.params) {
            tile.fill_path(&dot, &paint, FillRule::Winding, transform, None);
        }
    } else if let Some(path) = polyline(&stroke.points) {
        tile.stroke_path(&path, &paint, &stroke.params.skia_stroke(), transform, None);
    }
    copy_block(pixmap, (x0, y0), &tile, (0, 0), size);
}

/// The mark a stroke leaves when it never moves: its cap shape.
fn dot_path(center: Point, params: &RenderParams) -> Option<tiny_skia::Path> {
    let radius = (params.line_width / 2.0) as f32;
    if !radius.is_finite() || radius <= 0.0 {
        return None;
    }
    let (x, y) = (center.x as f32, center.y as f32);
    match params.line_cap {
        LineCap::Round => PathBuilder::from_circle(x, y, radius),
        LineCap::Square => {
            let side = radius * 2.0;
            tiny_skia::Rect::from_xywh(x - radius, y - radius, side, side).map(PathBuilder::from_rect)
        }
    }
}

/// Copy a `size` block of pixels from `src` at `src_origin` to `dst` at `dst_origin`.
fn copy_block(
    dst: &mut Pixmap,
    dst_origin: (u32, u32),
    src: &Pixmap,
    src_origin: (u32, u32),
    size: (u32, u32),
) {
    let (dst_stride, src_stride) = (dst.width() as usize * 4, src.width() as usize * 4);
    let row_len = size.0 as usize * 4;
    let src_data = src.data();
    let data = dst.data_mut();
    for row in 0..size.1 as usize {
        let d = (dst_origin.1 as usize + row) * dst_stride + dst_origin.0 as usize * 4;
        let s = (src_origin.1 as usize + row) * src_stride + src_origin.0 as usize * 4;
        data[d..d + row_len].copy_from_slice(&src_data[s..s + row_len]);
    }
}

fn polyline(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x as f32, first.y as f32);
    if rest.is_empty() {
        builder.line_to(first.x as f32, first.y as f32);
    }
    for p in rest {
        builder.line_to(p.x as f32, p.y as f32);
    }
    builder.finish()
}

/// Turn a coverage mask into a premultiplied color pixmap.
fn tint_mask(coverage: &[u8], width: u32, height: u32, color: InkColor, alpha: u8) -> Option<Pixmap> {
    let mut glyph = Pixmap::new(width, height)?;
    for (dst, &cov) in glyph.data_mut().chunks_exact_mut(4).zip(coverage) {
        let a = premultiply(alpha, cov);
        dst[0] = premultiply(color.r, a);
        dst[1] = premultiply(color.g, a);
        dst[2] = premultiply(color.b, a);
        dst[3] = a;
    }
    Some(glyph)
}
