//! Tool system: the active tool profile and its resolved render parameters.

use crate::color::InkColor;
use serde::{Deserialize, Serialize};

/// Smallest usable tool size.
pub const MIN_TOOL_SIZE: f64 = 1.0;

/// Font size per unit of tool size for the text tool.
pub const TEXT_SIZE_FACTOR: f64 = 8.0;

/// Colors the marker is allowed to use. The first entry is the fallback.
pub const MARKER_PALETTE: [InkColor; 5] = [
    InkColor::rgb(0xFF, 0xEB, 0x3B),
    InkColor::rgb(0x76, 0xFF, 0x03),
    InkColor::rgb(0xFF, 0x40, 0x81),
    InkColor::rgb(0x40, 0xC4, 0xFF),
    InkColor::rgb(0xFF, 0xAB, 0x40),
];

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Pencil,
    #[default]
    Pen,
    Marker,
    Fountain,
    Eraser,
    Text,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Pencil,
        ToolKind::Pen,
        ToolKind::Marker,
        ToolKind::Fountain,
        ToolKind::Eraser,
        ToolKind::Text,
    ];

    /// Fixed rendering semantics of this tool.
    pub const fn semantics(self) -> ToolSemantics {
        use CompositeMode::{Erase, Normal};
        match self {
            ToolKind::Pencil => ToolSemantics::new(Normal, 0.6, 1.0, LineCap::Round, LineJoin::Round),
            ToolKind::Pen => ToolSemantics::new(Normal, 1.0, 1.0, LineCap::Round, LineJoin::Round),
            ToolKind::Marker => ToolSemantics::new(Normal, 0.4, 4.0, LineCap::Square, LineJoin::Miter),
            ToolKind::Fountain => ToolSemantics::new(Normal, 0.9, 1.8, LineCap::Square, LineJoin::Miter),
            ToolKind::Eraser => ToolSemantics::new(Erase, 1.0, 2.0, LineCap::Round, LineJoin::Round),
            ToolKind::Text => {
                ToolSemantics::new(Normal, 1.0, TEXT_SIZE_FACTOR, LineCap::Round, LineJoin::Round)
            }
        }
    }

    /// Whether gestures with this tool lay down a stroke.
    pub fn draws_strokes(self) -> bool {
        !matches!(self, ToolKind::Eraser | ToolKind::Text)
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Pencil => "pencil",
            ToolKind::Pen => "pen",
            ToolKind::Marker => "marker",
            ToolKind::Fountain => "fountain",
            ToolKind::Eraser => "eraser",
            ToolKind::Text => "text",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// How new pixels combine with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeMode {
    /// Paint over existing pixels.
    Normal,
    /// Remove existing pixels.
    Erase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineCap {
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineJoin {
    Round,
    Miter,
}

/// Per-tool constants: one row of the tool table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSemantics {
    pub composite: CompositeMode,
    pub alpha: f32,
    pub width_factor: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
}

impl ToolSemantics {
    const fn new(
        composite: CompositeMode,
        alpha: f32,
        width_factor: f64,
        line_cap: LineCap,
        line_join: LineJoin,
    ) -> Self {
        Self {
            composite,
            alpha,
            width_factor,
            line_cap,
            line_join,
        }
    }
}

/// Concrete parameters for one stroke or stamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub composite: CompositeMode,
    /// Opacity in `[0, 1]`, multiplied with the color's own alpha.
    pub alpha: f32,
    /// Stroke width; font size for text.
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub color: InkColor,
}

impl RenderParams {
    pub(crate) fn skia_stroke(&self) -> tiny_skia::Stroke {
        tiny_skia::Stroke {
            width: self.line_width as f32,
            line_cap: match self.line_cap {
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match self.line_join {
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
            },
            ..tiny_skia::Stroke::default()
        }
    }

    pub(crate) fn skia_paint(&self) -> tiny_skia::Paint<'static> {
        let mut paint = tiny_skia::Paint::default();
        paint.anti_alias = true;
        match self.composite {
            CompositeMode::Normal => paint.set_color(self.color.to_skia(self.alpha)),
            CompositeMode::Erase => {
                paint.set_color(tiny_skia::Color::BLACK);
                paint.blend_mode = tiny_skia::BlendMode::DestinationOut;
            }
        }
        paint
    }
}

/// The current tool configuration. Exactly one is active per canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolProfile {
    pub tool: ToolKind,
    pub color: InkColor,
    pub size: f64,
}

impl Default for ToolProfile {
    fn default() -> Self {
        Self {
            tool: ToolKind::default(),
            color: InkColor::black(),
            size: 5.0,
        }
    }
}

impl ToolProfile {
    pub fn new(tool: ToolKind, color: InkColor, size: f64) -> Self {
        let mut profile = Self {
            tool,
            color,
            size: MIN_TOOL_SIZE,
        };
        profile.set_size(size);
        profile
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: InkColor) {
        self.color = color;
    }

    /// Set the size; non-finite or too small values fall back to the minimum.
    pub fn set_size(&mut self, size: f64) {
        self.size = if size.is_finite() {
            size.max(MIN_TOOL_SIZE)
        } else {
            MIN_TOOL_SIZE
        };
    }

    /// Resolve the profile into render parameters.
    pub fn render_params(&self) -> RenderParams {
        let semantics = self.tool.semantics();
        RenderParams {
            composite: semantics.composite,
            alpha: semantics.alpha,
            line_width: self.size * semantics.width_factor,
            line_cap: semantics.line_cap,
            line_join: semantics.line_join,
            color: self.effective_color(),
        }
    }

    /// The color actually used, after the marker palette constraint.
    pub fn effective_color(&self) -> InkColor {
        if self.tool == ToolKind::Marker
            && !MARKER_PALETTE.iter().any(|c| c.same_rgb(self.color))
        {
            return MARKER_PALETTE[0];
        }
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(tool: ToolKind, size: f64) -> RenderParams {
        ToolProfile::new(tool, InkColor::black(), size).render_params()
    }

    #[test]
    fn test_marker_params() {
        let p = params(ToolKind::Marker, 5.0);
        assert!((p.line_width - 20.0).abs() < f64::EPSILON);
        assert!((p.alpha - 0.4).abs() < f32::EPSILON);
        assert_eq!(p.composite, CompositeMode::Normal);
        assert_eq!(p.line_cap, LineCap::Square);
        assert_eq!(p.line_join, LineJoin::Miter);
    }

    #[test]
    fn test_tool_table() {
        let expected = [
            (ToolKind::Pencil, CompositeMode::Normal, 0.6, 10.0, LineCap::Round),
            (ToolKind::Pen, CompositeMode::Normal, 1.0, 10.0, LineCap::Round),
            (ToolKind::Marker, CompositeMode::Normal, 0.4, 40.0, LineCap::Square),
            (ToolKind::Fountain, CompositeMode::Normal, 0.9, 18.0, LineCap::Square),
            (ToolKind::Eraser, CompositeMode::Erase, 1.0, 20.0, LineCap::Round),
            (ToolKind::Text, CompositeMode::Normal, 1.0, 80.0, LineCap::Round),
        ];
        for (tool, composite, alpha, width, cap) in expected {
            let p = params(tool, 10.0);
            assert_eq!(p.composite, composite, "{tool:?}");
            assert!((p.alpha - alpha).abs() < f32::EPSILON, "{tool:?}");
            assert!((p.line_width - width).abs() < 1e-9, "{tool:?}");
            assert_eq!(p.line_cap, cap, "{tool:?}");
        }
    }

    #[test]
    fn test_marker_substitutes_color_outside_palette() {
        let profile = ToolProfile::new(ToolKind::Marker, InkColor::black(), 5.0);
        assert_eq!(profile.render_params().color, MARKER_PALETTE[0]);

        let pink = MARKER_PALETTE[2];
        let profile = ToolProfile::new(ToolKind::Marker, pink, 5.0);
        assert_eq!(profile.render_params().color, pink);
    }

    #[test]
    fn test_other_tools_keep_color() {
        let color = InkColor::rgb(1, 2, 3);
        let profile = ToolProfile::new(ToolKind::Pen, color, 5.0);
        assert_eq!(profile.render_params().color, color);
    }

    #[test]
    fn test_invalid_size_clamped() {
        let mut profile = ToolProfile::default();
        profile.set_size(f64::NAN);
        assert_eq!(profile.size, MIN_TOOL_SIZE);
        profile.set_size(-3.0);
        assert_eq!(profile.size, MIN_TOOL_SIZE);
        profile.set_size(12.0);
        assert_eq!(profile.size, 12.0);
    }

    #[test]
    fn test_tool_names() {
        for tool in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(tool.name()), Some(tool));
        }
        assert_eq!(ToolKind::from_name("MARKER"), Some(ToolKind::Marker));
        assert_eq!(ToolKind::from_name("laser"), None);
    }
}
