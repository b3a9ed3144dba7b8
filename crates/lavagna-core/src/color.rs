//! Ink colors.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA8 color used by tools and backgrounds.
///
/// Serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for InkColor {
    fn default() -> Self {
        Self::black()
    }
}

impl InkColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Same RGB channels, ignoring alpha.
    pub fn same_rgb(self, other: Self) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }

    /// Rasterizer color with an extra opacity factor applied.
    pub(crate) fn to_skia(self, opacity: f32) -> tiny_skia::Color {
        let alpha = (self.a as f32 / 255.0 * opacity.clamp(0.0, 1.0)).clamp(0.0, 1.0);
        let mut color = tiny_skia::Color::from_rgba8(self.r, self.g, self.b, 255);
        color.set_alpha(alpha);
        color
    }
}

impl TryFrom<String> for InkColor {
    type Error = String;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Self::from_hex(&hex).ok_or_else(|| format!("invalid color {:?}", hex))
    }
}

impl From<InkColor> for String {
    fn from(color: InkColor) -> Self {
        color.to_hex()
    }
}

impl From<Color> for InkColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<InkColor> for Color {
    fn from(color: InkColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_hex() {
        assert_eq!(InkColor::from_hex("#f0a"), Some(InkColor::rgb(255, 0, 170)));
    }

    #[test]
    fn test_parse_long_hex() {
        assert_eq!(InkColor::from_hex("#FFEB3B"), Some(InkColor::rgb(255, 235, 59)));
        assert_eq!(
            InkColor::from_hex("#00000080"),
            Some(InkColor::new(0, 0, 0, 128))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(InkColor::from_hex("red"), None);
        assert_eq!(InkColor::from_hex("#12345"), None);
        assert_eq!(InkColor::from_hex("#gggggg"), None);
    }

    #[test]
    fn test_hex_roundtrip() {
        let color = InkColor::rgb(18, 52, 86);
        assert_eq!(color.to_hex(), "#123456");
        assert_eq!(InkColor::from_hex(&color.to_hex()), Some(color));
    }

    #[test]
    fn test_serde_as_hex() {
        let json = serde_json::to_string(&InkColor::rgb(255, 64, 129)).unwrap();
        assert_eq!(json, "\"#ff4081\"");
        let parsed: InkColor = serde_json::from_str("\"#40C4FF\"").unwrap();
        assert_eq!(parsed, InkColor::rgb(0x40, 0xC4, 0xFF));
        assert!(serde_json::from_str::<InkColor>("\"blue\"").is_err());
    }

    #[test]
    fn test_peniko_conversion() {
        let color = InkColor::new(10, 20, 30, 40);
        let peniko: Color = color.into();
        assert_eq!(InkColor::from(peniko), color);
    }
}
