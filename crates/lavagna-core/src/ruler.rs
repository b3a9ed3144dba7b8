//! Rotatable straight-edge for guided lines.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RULER_LENGTH: f64 = 500.0;
pub const DEFAULT_RULER_THICKNESS: f64 = 60.0;
/// Distance from a long edge within which a gesture snaps to it.
pub const DEFAULT_EDGE_TOLERANCE: f64 = 15.0;

/// One of the ruler's two long edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulerEdge {
    Top,
    Bottom,
}

/// A ruler placed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ruler {
    pub center: Point,
    /// Rotation in radians.
    pub angle: f64,
    pub length: f64,
    pub thickness: f64,
    pub tolerance: f64,
}

impl Ruler {
    pub fn new(center: Point) -> Self {
        Self {
            center,
            angle: 0.0,
            length: DEFAULT_RULER_LENGTH,
            thickness: DEFAULT_RULER_THICKNESS,
            tolerance: DEFAULT_EDGE_TOLERANCE,
        }
    }

    /// Ruler space to board space.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.center.to_vec2()) * Affine::rotate(self.angle)
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.center += delta;
    }

    pub fn rotate_by(&mut self, radians: f64) {
        self.angle += radians;
    }

    fn to_local(&self, point: Point) -> Point {
        self.transform().inverse() * point
    }

    /// The long edge `point` is close enough to, if any.
    pub fn edge_at(&self, point: Point) -> Option<RulerEdge> {
        let local = self.to_local(point);
        let half_len = self.length / 2.0;
        let half_thick = self.thickness / 2.0;
        if local.x.abs() > half_len + self.tolerance {
            return None;
        }
        let top = (local.y + half_thick).abs();
        let bottom = (local.y - half_thick).abs();
        if top <= bottom && top <= self.tolerance {
            Some(RulerEdge::Top)
        } else if bottom < top && bottom <= self.tolerance {
            Some(RulerEdge::Bottom)
        } else {
            None
        }
    }

    /// Project `point` onto `edge`, limited to the ruler's length.
    pub fn snap(&self, point: Point, edge: RulerEdge) -> Point {
        let local = self.to_local(point);
        let half_len = self.length / 2.0;
        let y = match edge {
            RulerEdge::Top => -self.thickness / 2.0,
            RulerEdge::Bottom => self.thickness / 2.0,
        };
        self.transform() * Point::new(local.x.clamp(-half_len, half_len), y)
    }

    /// Corners in board space, clockwise from top-left.
    pub fn corners(&self) -> [Point; 4] {
        let (hl, ht) = (self.length / 2.0, self.thickness / 2.0);
        let t = self.transform();
        [
            t * Point::new(-hl, -ht),
            t * Point::new(hl, -ht),
            t * Point::new(hl, ht),
            t * Point::new(-hl, ht),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_edge_hit() {
        let ruler = Ruler::new(Point::new(300.0, 300.0));
        assert_eq!(ruler.edge_at(Point::new(300.0, 265.0)), Some(RulerEdge::Top));
        assert_eq!(ruler.edge_at(Point::new(400.0, 340.0)), Some(RulerEdge::Bottom));
        assert_eq!(ruler.edge_at(Point::new(300.0, 300.0)), None);
        assert_eq!(ruler.edge_at(Point::new(900.0, 270.0)), None);
    }

    #[test]
    fn test_snap_to_edge() {
        let ruler = Ruler::new(Point::new(300.0, 300.0));
        let snapped = ruler.snap(Point::new(320.0, 262.0), RulerEdge::Top);
        assert!(close(snapped, Point::new(320.0, 270.0)));
        let clamped = ruler.snap(Point::new(1000.0, 280.0), RulerEdge::Top);
        assert!(close(clamped, Point::new(550.0, 270.0)));
    }

    #[test]
    fn test_rotated_ruler() {
        let mut ruler = Ruler::new(Point::new(0.0, 0.0));
        ruler.rotate_by(FRAC_PI_2);
        // Rotated a quarter turn, the top edge runs vertically at x = 30.
        assert_eq!(ruler.edge_at(Point::new(28.0, 100.0)), Some(RulerEdge::Top));
        let snapped = ruler.snap(Point::new(25.0, 100.0), RulerEdge::Top);
        assert!(close(snapped, Point::new(30.0, 100.0)));
    }

    #[test]
    fn test_corners() {
        let ruler = Ruler::new(Point::new(250.0, 30.0));
        let corners = ruler.corners();
        assert!(close(corners[0], Point::new(0.0, 0.0)));
        assert!(close(corners[2], Point::new(500.0, 60.0)));
    }
}
