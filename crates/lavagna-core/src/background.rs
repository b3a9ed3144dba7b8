//! Board background: a solid color with an optional pattern.
//!
//! The background is composed under the buffer only when flattening, so
//! erasing and lasso sampling never see it.

use crate::color::InkColor;
use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Distance between pattern lines or dots.
pub const PATTERN_SPACING: f32 = 20.0;

const PATTERN_COLOR: InkColor = InkColor::rgb(0xE0, 0xE0, 0xE0);
const DOT_RADIUS: f32 = 1.5;

/// Background pattern style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundPattern {
    #[default]
    Plain,
    /// Horizontal ruled lines.
    Lines,
    Grid,
    Dots,
}

impl BackgroundPattern {
    /// Cycle to the next pattern.
    pub fn next(self) -> Self {
        match self {
            BackgroundPattern::Plain => BackgroundPattern::Lines,
            BackgroundPattern::Lines => BackgroundPattern::Grid,
            BackgroundPattern::Grid => BackgroundPattern::Dots,
            BackgroundPattern::Dots => BackgroundPattern::Plain,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BackgroundPattern::Plain => "Plain",
            BackgroundPattern::Lines => "Lines",
            BackgroundPattern::Grid => "Grid",
            BackgroundPattern::Dots => "Dots",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    #[serde(default)]
    pub pattern: BackgroundPattern,
    #[serde(default = "default_background_color")]
    pub color: InkColor,
}

fn default_background_color() -> InkColor {
    InkColor::white()
}

impl Default for Background {
    fn default() -> Self {
        Self {
            pattern: BackgroundPattern::default(),
            color: default_background_color(),
        }
    }
}

impl Background {
    /// Render the background at the given size. `None` for zero dimensions.
    pub fn render(&self, width: u32, height: u32) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(width, height)?;
        pixmap.fill(self.color.to_skia(1.0));

        let (w, h) = (width as f32, height as f32);
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color(PATTERN_COLOR.to_skia(1.0));

        match self.pattern {
            BackgroundPattern::Plain => {}
            BackgroundPattern::Lines | BackgroundPattern::Grid => {
                let mut pb = PathBuilder::new();
                for y in steps(h) {
                    pb.move_to(0.0, y);
                    pb.line_to(w, y);
                }
                if self.pattern == BackgroundPattern::Grid {
                    for x in steps(w) {
                        pb.move_to(x, 0.0);
                        pb.line_to(x, h);
                    }
                }
                if let Some(path) = pb.finish() {
                    let stroke = Stroke {
                        width: 1.0,
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
                }
            }
            BackgroundPattern::Dots => {
                let mut pb = PathBuilder::new();
                for y in steps(h) {
                    for x in steps(w) {
                        pb.push_circle(x, y, DOT_RADIUS);
                    }
                }
                if let Some(path) = pb.finish() {
                    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
                }
            }
        }
        Some(pixmap)
    }
}

/// Pattern positions along one axis, half a pixel in so lines stay crisp.
fn steps(extent: f32) -> impl Iterator<Item = f32> {
    (1..)
        .map(|i| i as f32 * PATTERN_SPACING + 0.5)
        .take_while(move |v| *v < extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let px = pixmap.pixel(x, y).unwrap();
        (px.red(), px.green(), px.blue(), px.alpha())
    }

    #[test]
    fn test_plain_background_is_solid() {
        let bg = Background::default();
        let pixmap = bg.render(30, 30).unwrap();
        assert_eq!(pixel(&pixmap, 20, 20), (255, 255, 255, 255));
    }

    #[test]
    fn test_grid_draws_lines() {
        let bg = Background {
            pattern: BackgroundPattern::Grid,
            color: InkColor::white(),
        };
        let pixmap = bg.render(50, 50).unwrap();
        assert_ne!(pixel(&pixmap, 20, 7), (255, 255, 255, 255));
        assert_ne!(pixel(&pixmap, 7, 20), (255, 255, 255, 255));
        assert_eq!(pixel(&pixmap, 7, 7), (255, 255, 255, 255));
    }

    #[test]
    fn test_lines_are_horizontal_only() {
        let bg = Background {
            pattern: BackgroundPattern::Lines,
            color: InkColor::white(),
        };
        let pixmap = bg.render(50, 50).unwrap();
        assert_ne!(pixel(&pixmap, 7, 20), (255, 255, 255, 255));
        assert_eq!(pixel(&pixmap, 20, 7), (255, 255, 255, 255));
    }

    #[test]
    fn test_dots() {
        let bg = Background {
            pattern: BackgroundPattern::Dots,
            color: InkColor::white(),
        };
        let pixmap = bg.render(50, 50).unwrap();
        assert_ne!(pixel(&pixmap, 20, 20), (255, 255, 255, 255));
        assert_eq!(pixel(&pixmap, 10, 20), (255, 255, 255, 255));
    }

    #[test]
    fn test_pattern_cycle() {
        let mut pattern = BackgroundPattern::Plain;
        for _ in 0..4 {
            pattern = pattern.next();
        }
        assert_eq!(pattern, BackgroundPattern::Plain);
        assert_eq!(BackgroundPattern::Grid.name(), "Grid");
    }

    #[test]
    fn test_background_json_defaults() {
        let bg: Background = serde_json::from_str(r#"{"pattern":"dots"}"#).unwrap();
        assert_eq!(bg.pattern, BackgroundPattern::Dots);
        assert_eq!(bg.color, InkColor::white());
    }
}
