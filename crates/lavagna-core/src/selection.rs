//! Freehand lasso selection over the raster buffer.
//!
//! Selection is coarse: the polygon's bounding box is sampled on a grid and
//! every inked sample inside the polygon contributes a small square region.

use crate::color::InkColor;
use crate::surface::Surface;
use kurbo::{Point, Rect};

/// Grid spacing used when sampling the buffer.
pub const SAMPLE_STRIDE: u32 = 5;
/// Side of the square region emitted per inked sample.
pub const REGION_SIZE: f64 = 20.0;
/// Samples closer than this to an existing region center are merged into it.
pub const DEDUP_DISTANCE: f64 = 15.0;

const OUTLINE_COLOR: InkColor = InkColor::rgb(0x21, 0x96, 0xF3);

/// Axis-aligned area flagged for deletion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SelectedRegion {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.rect().contains(point)
    }
}

/// Lasso gesture state.
#[derive(Debug, Clone, Default)]
pub struct LassoSelection {
    path: Option<Vec<Point>>,
}

impl LassoSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.path.is_some()
    }

    pub fn points(&self) -> &[Point] {
        self.path.as_deref().unwrap_or(&[])
    }

    /// Start a new path, discarding any unfinished one.
    pub fn begin(&mut self, point: Point, surface: &mut Surface) {
        self.path = Some(vec![surface.clamp_point(point)]);
        surface.clear_overlay();
    }

    /// Append a point and redraw the outline on the overlay.
    pub fn extend(&mut self, point: Point, surface: &mut Surface) {
        let Some(path) = self.path.as_mut() else {
            return;
        };
        path.push(surface.clamp_point(point));
        surface.draw_overlay_polyline(path, OUTLINE_COLOR, true);
    }

    /// Close the path and resolve it against the buffer.
    pub fn complete(&mut self, surface: &mut Surface) -> Vec<SelectedRegion> {
        surface.clear_overlay();
        let Some(path) = self.path.take() else {
            return Vec::new();
        };
        let regions = select_regions(&path, surface);
        log::debug!("Lasso of {} points selected {} regions", path.len(), regions.len());
        regions
    }

    /// Drop the path without selecting anything.
    pub fn cancel(&mut self, surface: &mut Surface) {
        self.path = None;
        surface.clear_overlay();
    }
}

/// Sample `surface` inside `polygon` and build deletion regions.
pub fn select_regions(polygon: &[Point], surface: &Surface) -> Vec<SelectedRegion> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    let bounds = polygon
        .iter()
        .skip(1)
        .fold(Rect::from_points(polygon[0], polygon[0]), |r, &p| r.union_pt(p));
    let clip = Rect::new(0.0, 0.0, surface.width() as f64, surface.height() as f64);
    let bounds = bounds.intersect(clip);
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return Vec::new();
    }

    let mut regions: Vec<SelectedRegion> = Vec::new();
    let stride = SAMPLE_STRIDE as usize;
    let (x0, y0) = (bounds.x0.floor() as u32, bounds.y0.floor() as u32);
    let (x1, y1) = (bounds.x1.ceil() as u32, bounds.y1.ceil() as u32);

    for y in (y0..y1.min(surface.height())).step_by(stride) {
        for x in (x0..x1.min(surface.width())).step_by(stride) {
            let sample = Point::new(x as f64, y as f64);
            if surface.alpha_at(x, y) == 0 || !point_in_polygon(sample, polygon) {
                continue;
            }
            if regions
                .iter()
                .any(|r| r.center().distance(sample) < DEDUP_DISTANCE)
            {
                continue;
            }
            let rect = Rect::from_center_size(sample, (REGION_SIZE, REGION_SIZE)).intersect(clip);
            regions.push(SelectedRegion {
                x: rect.x0,
                y: rect.y0,
                width: rect.width(),
                height: rect.height(),
            });
        }
    }
    regions
}

/// Even-odd ray casting test. Paths with fewer than 3 points contain nothing.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::Bitmap;

    fn square(size: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ]
    }

    fn marked_surface() -> Surface {
        let mut surface = Surface::new(100, 100);
        surface.draw_bitmap(
            &Bitmap::solid(1, 1, InkColor::black()).unwrap(),
            Rect::new(20.0, 20.0, 30.0, 30.0),
        );
        surface
    }

    #[test]
    fn test_point_in_polygon() {
        let poly = square(10.0);
        assert!(point_in_polygon(Point::new(5.0, 5.0), &poly));
        assert!(!point_in_polygon(Point::new(15.0, 5.0), &poly));
        assert!(!point_in_polygon(Point::new(-1.0, 5.0), &poly));
    }

    #[test]
    fn test_concave_polygon() {
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 30.0),
            Point::new(20.0, 30.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 30.0),
            Point::new(0.0, 30.0),
        ];
        assert!(point_in_polygon(Point::new(5.0, 20.0), &poly));
        assert!(!point_in_polygon(Point::new(15.0, 20.0), &poly));
    }

    #[test]
    fn test_degenerate_paths_contain_nothing() {
        assert!(!point_in_polygon(Point::new(0.0, 0.0), &[]));
        assert!(!point_in_polygon(
            Point::new(1.0, 1.0),
            &[Point::new(0.0, 0.0), Point::new(2.0, 2.0)]
        ));
    }

    #[test]
    fn test_lasso_over_single_mark() {
        let surface = marked_surface();
        let regions = select_regions(&square(50.0), &surface);
        assert_eq!(regions.len(), 1);
        assert!(regions[0].contains(Point::new(20.0, 20.0)));
    }

    #[test]
    fn test_lasso_outside_mark_selects_nothing() {
        let surface = marked_surface();
        let poly = vec![
            Point::new(60.0, 60.0),
            Point::new(90.0, 60.0),
            Point::new(90.0, 90.0),
        ];
        assert!(select_regions(&poly, &surface).is_empty());
    }

    #[test]
    fn test_regions_clipped_to_buffer() {
        let mut surface = Surface::new(40, 40);
        surface.draw_bitmap(
            &Bitmap::solid(1, 1, InkColor::black()).unwrap(),
            Rect::new(0.0, 0.0, 4.0, 4.0),
        );
        let regions = select_regions(&square(30.0), &surface);
        assert_eq!(regions.len(), 1);
        assert_eq!((regions[0].x, regions[0].y), (0.0, 0.0));
        assert_eq!(regions[0].width, 10.0);
    }

    #[test]
    fn test_lasso_gesture_uses_overlay() {
        let mut surface = marked_surface();
        let mut lasso = LassoSelection::new();
        lasso.begin(Point::new(0.0, 0.0), &mut surface);
        for p in square(50.0).into_iter().skip(1) {
            lasso.extend(p, &mut surface);
        }
        assert!(!surface.overlay_is_empty());
        let regions = lasso.complete(&mut surface);
        assert_eq!(regions.len(), 1);
        assert!(surface.overlay_is_empty());
        assert!(!lasso.is_active());
    }

    #[test]
    fn test_short_path_yields_nothing() {
        let mut surface = marked_surface();
        let mut lasso = LassoSelection::new();
        lasso.begin(Point::new(20.0, 20.0), &mut surface);
        lasso.extend(Point::new(25.0, 25.0), &mut surface);
        assert!(lasso.complete(&mut surface).is_empty());
    }
}
