use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::outline::{PathCommand, parse_outline};

/// Glyph used when the requested character is missing from the font.
pub const FALLBACK_GLYPH: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "xMin", default)]
    pub x_min: f32,
    #[serde(rename = "xMax", default)]
    pub x_max: f32,
    #[serde(rename = "yMin")]
    pub y_min: f32,
    #[serde(rename = "yMax")]
    pub y_max: f32,
}

/// One glyph: horizontal advance plus an outline command string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// Horizontal advance in font units.
    pub ha: f32,
    #[serde(default)]
    pub x_min: Option<f32>,
    #[serde(default)]
    pub x_max: Option<f32>,
    /// Outline commands; absent for blank glyphs such as space.
    #[serde(default)]
    pub o: Option<String>,
}

impl Glyph {
    pub fn commands(&self) -> Result<Vec<PathCommand>, AssetError> {
        match &self.o {
            Some(o) => parse_outline(o),
            None => Ok(Vec::new()),
        }
    }
}

/// A typeface JSON font: glyph outlines in font units at a given resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typeface {
    pub glyphs: BTreeMap<String, Glyph>,
    #[serde(rename = "familyName", default)]
    pub family_name: String,
    pub resolution: f32,
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
    #[serde(rename = "underlineThickness", default)]
    pub underline_thickness: f32,
}

impl Typeface {
    pub fn from_json(text: &str) -> Result<Self, AssetError> {
        let face: Typeface = serde_json::from_str(text)?;
        if face.resolution <= 0.0 {
            return Err(AssetError::Typeface(format!(
                "resolution must be positive, got {}",
                face.resolution
            )));
        }
        Ok(face)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AssetError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AssetError::Typeface(format!("font is not UTF-8: {e}")))?;
        Self::from_json(text)
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        let mut buf = [0u8; 4];
        self.glyphs.get(&*c.encode_utf8(&mut buf))
    }

    /// Glyph for `c`, or the fallback glyph when `c` is missing.
    pub fn glyph_or_fallback(&self, c: char) -> Option<&Glyph> {
        self.glyph(c).or_else(|| self.glyph(FALLBACK_GLYPH))
    }

    /// Font units to world units for a given text size.
    pub fn scale(&self, size: f32) -> f32 {
        size / self.resolution
    }

    pub fn line_height(&self, size: f32) -> f32 {
        (self.bounding_box.y_max - self.bounding_box.y_min + self.underline_thickness)
            * self.scale(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT: &str = r#"{
        "glyphs": {
            "A": { "ha": 600, "x_min": 0, "x_max": 600, "o": "m 0 0 l 600 0 l 300 700 z" },
            "?": { "ha": 500, "o": "m 0 0 l 500 0 l 500 500 l 0 500" },
            " ": { "ha": 250 }
        },
        "familyName": "Test",
        "resolution": 1000,
        "boundingBox": { "yMin": -200, "xMin": 0, "yMax": 800, "xMax": 600 },
        "underlineThickness": 50
    }"#;

    #[test]
    fn parses_typeface_json() {
        let face = Typeface::from_json(FONT).unwrap();
        assert_eq!(face.family_name, "Test");
        assert_eq!(face.glyphs.len(), 3);
        assert_eq!(face.glyph('A').unwrap().ha, 600.0);
        assert!(face.glyph(' ').unwrap().o.is_none());
    }

    #[test]
    fn missing_glyph_falls_back() {
        let face = Typeface::from_json(FONT).unwrap();
        assert!(face.glyph('Z').is_none());
        assert_eq!(face.glyph_or_fallback('Z').unwrap().ha, 500.0);
    }

    #[test]
    fn line_height_scales_with_size() {
        let face = Typeface::from_json(FONT).unwrap();
        assert!((face.line_height(1.0) - 1.05).abs() < 1e-6);
        assert!((face.scale(0.7) - 0.0007).abs() < 1e-9);
    }

    #[test]
    fn rejects_zero_resolution() {
        let bad = FONT.replace("\"resolution\": 1000", "\"resolution\": 0");
        assert!(matches!(Typeface::from_json(&bad), Err(AssetError::Typeface(_))));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(Typeface::from_json("{"), Err(AssetError::Json(_))));
    }
}
