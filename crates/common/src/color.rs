use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// RGB color with sRGB-encoded channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid color literal: {0:?}")]
pub struct ColorParseError(pub String);

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Packed `0xRRGGBB` value, channels rounded to the nearest byte.
    pub fn to_hex(&self) -> u32 {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (byte(self.r) << 16) | (byte(self.g) << 8) | byte(self.b)
    }

    /// Convert sRGB-encoded channels to linear light.
    pub fn to_linear(&self) -> [f32; 3] {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [channel(self.r), channel(self.g), channel(self.b)]
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Color::from_hex(hex)
    }
}

/// Accepts `#rrggbb`, `0xrrggbb` or bare `rrggbb`.
impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);
        if digits.len() != 6 {
            return Err(ColorParseError(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Color::from_hex)
            .map_err(|_| ColorParseError(s.to_string()))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_keeps_value() {
        for hex in [0x8fbcd4, 0xf61067, 0x00d4ff, 0xff0000, 0x020024] {
            assert_eq!(Color::from_hex(hex).to_hex(), hex);
        }
    }

    #[test]
    fn parses_css_style_literal() {
        let c: Color = "#020024".parse().unwrap();
        assert_eq!(c.to_hex(), 0x020024);
        let c: Color = "0xF8B500".parse().unwrap();
        assert_eq!(c.to_hex(), 0xf8b500);
    }

    #[test]
    fn rejects_bad_literal() {
        assert!("#12345".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn linear_conversion_endpoints() {
        assert_eq!(Color::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        let w = Color::WHITE.to_linear();
        assert!((w[0] - 1.0).abs() < 1e-6);
        let mid = Color::rgb(0.5, 0.5, 0.5).to_linear();
        assert!((mid[0] - 0.214).abs() < 0.01);
    }

    #[test]
    fn display_is_css_hex() {
        assert_eq!(Color::from_hex(0xf61067).to_string(), "#f61067");
    }
}
