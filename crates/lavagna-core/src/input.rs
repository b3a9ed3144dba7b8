//! Pointer input normalization for mouse, touch and stylus events.

use crate::surface::clamp_to;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Raw pointer event in client (window) coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawInput {
    MouseDown { position: Point },
    MouseMove { position: Point },
    MouseUp { position: Point },
    MouseLeave,
    /// Only the first touch point is used.
    TouchStart { touches: Vec<Point> },
    TouchMove { touches: Vec<Point> },
    TouchEnd { touches: Vec<Point> },
    TouchCancel,
    /// Pressure is accepted but not used.
    StylusDown {
        position: Point,
        #[serde(default)]
        pressure: f32,
    },
    StylusMove {
        position: Point,
        #[serde(default)]
        pressure: f32,
    },
    StylusUp { position: Point },
}

/// A drawing gesture in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Begin(Point),
    Move(Point),
    End,
}

/// Where the surface sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportMapping {
    /// Top-left corner of the displayed surface in client coordinates.
    pub origin: Point,
    /// Size the surface is displayed at.
    pub displayed: Size,
    /// Backing buffer size.
    pub surface: Size,
    /// Offset added after scaling.
    pub calibration: Vec2,
}

impl ViewportMapping {
    /// Identity mapping for a surface displayed at its own size at (0,0).
    pub fn identity(surface: Size) -> Self {
        Self {
            origin: Point::ZERO,
            displayed: surface,
            surface,
            calibration: Vec2::ZERO,
        }
    }

    /// Client to surface transform. A zero displayed size scales by 1.
    pub fn transform(&self) -> Affine {
        let scale = |surface: f64, displayed: f64| {
            if displayed > 0.0 && displayed.is_finite() {
                surface / displayed
            } else {
                1.0
            }
        };
        Affine::translate(self.calibration)
            * Affine::scale_non_uniform(
                scale(self.surface.width, self.displayed.width),
                scale(self.surface.height, self.displayed.height),
            )
            * Affine::translate(-self.origin.to_vec2())
    }

    /// Convert a client point to a clamped surface point.
    ///
    /// Axes are mapped independently so a NaN on one axis only zeroes that axis.
    pub fn client_to_surface(&self, client: Point) -> Point {
        let [sx, _, _, sy, tx, ty] = self.transform().as_coeffs();
        clamp_to(
            Point::new(sx * client.x + tx, sy * client.y + ty),
            self.surface,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PointerState {
    #[default]
    Idle,
    Active,
}

/// Collapses raw events into `Begin`/`Move`/`End` gestures.
#[derive(Debug, Clone)]
pub struct PointerPipeline {
    mapping: ViewportMapping,
    state: PointerState,
}

impl PointerPipeline {
    pub fn new(mapping: ViewportMapping) -> Self {
        Self {
            mapping,
            state: PointerState::Idle,
        }
    }

    pub fn mapping(&self) -> &ViewportMapping {
        &self.mapping
    }

    pub fn set_mapping(&mut self, mapping: ViewportMapping) {
        self.mapping = mapping;
    }

    /// Update the surface size after a resize.
    pub fn set_surface_size(&mut self, surface: Size) {
        self.mapping.surface = surface;
    }

    pub fn set_calibration(&mut self, offset: Vec2) {
        self.mapping.calibration = offset;
    }

    pub fn reset_calibration(&mut self) {
        self.mapping.calibration = Vec2::ZERO;
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.state == PointerState::Active
    }

    /// Drop any gesture in progress without emitting `End`.
    pub fn reset(&mut self) {
        self.state = PointerState::Idle;
    }

    /// Feed one raw event. Returns the gestures it produces, in order.
    pub fn process(&mut self, input: &RawInput) -> Vec<Gesture> {
        match input {
            RawInput::MouseDown { position } | RawInput::StylusDown { position, .. } => {
                self.begin(*position)
            }
            RawInput::TouchStart { touches } => match touches.first() {
                Some(&position) => self.begin(position),
                None => Vec::new(),
            },
            RawInput::MouseMove { position } | RawInput::StylusMove { position, .. } => {
                self.move_to(*position)
            }
            RawInput::TouchMove { touches } => match touches.first() {
                Some(&position) => self.move_to(position),
                None => Vec::new(),
            },
            RawInput::MouseUp { .. }
            | RawInput::MouseLeave
            | RawInput::TouchEnd { .. }
            | RawInput::TouchCancel
            | RawInput::StylusUp { .. } => self.end(),
        }
    }

    fn begin(&mut self, client: Point) -> Vec<Gesture> {
        let point = self.mapping.client_to_surface(client);
        let mut gestures = Vec::with_capacity(2);
        if self.state == PointerState::Active {
            log::debug!("Begin while active, closing previous gesture");
            gestures.push(Gesture::End);
        }
        self.state = PointerState::Active;
        gestures.push(Gesture::Begin(point));
        gestures
    }

    fn move_to(&mut self, client: Point) -> Vec<Gesture> {
        match self.state {
            PointerState::Active => vec![Gesture::Move(self.mapping.client_to_surface(client))],
            PointerState::Idle => Vec::new(),
        }
    }

    fn end(&mut self) -> Vec<Gesture> {
        match self.state {
            PointerState::Active => {
                self.state = PointerState::Idle;
                vec![Gesture::End]
            }
            PointerState::Idle => Vec::new(),
        }
    }
}
