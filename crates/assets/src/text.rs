use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tableau_scene::{Geometry, GeometryKind};
use tracing::{debug, warn};

use crate::error::AssetError;
use crate::outline::{contains_point, flatten, signed_area};
use crate::triangulate::triangulate;
use crate::typeface::Typeface;

/// Parameters for extruded text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextOptions {
    /// Cap height scale: glyph units are multiplied by `size / resolution`.
    pub size: f32,
    /// Extrusion depth along +Z. Zero yields flat text (caps only).
    pub depth: f32,
    /// Points generated per curve command.
    pub curve_segments: usize,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: 1.0,
            depth: 0.0,
            curve_segments: 12,
        }
    }
}

impl TextOptions {
    pub fn new(size: f32, depth: f32) -> Self {
        Self {
            size,
            depth,
            ..Self::default()
        }
    }
}

/// A filled region: one counter-clockwise outer contour and its clockwise
/// holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub outer: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

/// Lay out `text` and return its filled shapes in world units.
pub fn text_shapes(font: &Typeface, text: &str, options: &TextOptions) -> Result<Vec<Shape>, AssetError> {
    let scale = font.scale(options.size);
    let line_height = font.line_height(options.size);
    let mut offset = Vec2::ZERO;
    let mut shapes = Vec::new();

    for c in text.chars() {
        if c == '\n' {
            offset.x = 0.0;
            offset.y -= line_height;
            continue;
        }
        let Some(glyph) = font.glyph_or_fallback(c) else {
            warn!(character = ?c, "glyph missing and font has no fallback glyph");
            continue;
        };
        let contours = flatten(&glyph.commands()?, options.curve_segments, scale, offset);
        shapes.extend(classify(contours));
        offset.x += glyph.ha * scale;
    }
    Ok(shapes)
}

/// Split contours into solids and holes. The winding of the largest contour
/// marks solids; contours wound the other way are holes, each attached to
/// the smallest solid containing it.
fn classify(contours: Vec<Vec<Vec2>>) -> Vec<Shape> {
    let areas: Vec<f32> = contours.iter().map(|c| signed_area(c)).collect();
    let Some(solid_sign) = areas
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .map(f32::signum)
    else {
        return Vec::new();
    };

    let mut shapes: Vec<(f32, Shape)> = Vec::new();
    let mut holes = Vec::new();
    for (mut contour, area) in contours.into_iter().zip(areas) {
        if area.signum() == solid_sign {
            if area < 0.0 {
                contour.reverse();
            }
            shapes.push((
                area.abs(),
                Shape {
                    outer: contour,
                    holes: Vec::new(),
                },
            ));
        } else {
            if area > 0.0 {
                contour.reverse();
            }
            holes.push(contour);
        }
    }

    for hole in holes {
        let owner = shapes
            .iter_mut()
            .filter(|(_, s)| contains_point(&s.outer, hole[0]))
            .min_by(|a, b| a.0.total_cmp(&b.0));
        match owner {
            Some((_, shape)) => shape.holes.push(hole),
            None => debug!(points = hole.len(), "hole outside every solid contour dropped"),
        }
    }
    shapes.into_iter().map(|(_, s)| s).collect()
}

/// Build extruded text geometry: a front cap at `z = depth`, a back cap at
/// `z = 0` and side walls between them.
pub fn text_geometry(font: &Typeface, text: &str, options: &TextOptions) -> Result<Geometry, AssetError> {
    let shapes = text_shapes(font, text, options)?;
    let depth = options.depth.max(0.0);

    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for shape in &shapes {
        let tri = triangulate(&shape.outer, &shape.holes);

        // Front cap.
        let base = positions.len() as u32;
        for p in &tri.points {
            positions.push(p.extend(depth));
            normals.push(Vec3::Z);
            uvs.push(*p);
        }
        for [a, b, c] in &tri.triangles {
            indices.extend_from_slice(&[base + a, base + b, base + c]);
        }

        // Back cap, reversed winding.
        let base = positions.len() as u32;
        for p in &tri.points {
            positions.push(p.extend(0.0));
            normals.push(Vec3::NEG_Z);
            uvs.push(*p);
        }
        for [a, b, c] in &tri.triangles {
            indices.extend_from_slice(&[base + a, base + c, base + b]);
        }

        if depth > 0.0 {
            for contour in std::iter::once(&shape.outer).chain(shape.holes.iter()) {
                side_walls(contour, depth, &mut positions, &mut normals, &mut uvs, &mut indices);
            }
        }
    }

    debug!(
        text = %text,
        shapes = shapes.len(),
        vertices = positions.len(),
        triangles = indices.len() / 3,
        "text geometry built"
    );
    Ok(Geometry::from_triangles(
        GeometryKind::Text {
            text: text.to_string(),
            size: options.size,
            depth,
        },
        positions,
        normals,
        uvs,
        indices,
    ))
}

fn side_walls(
    contour: &[Vec2],
    depth: f32,
    positions: &mut Vec<Vec3>,
    normals: &mut Vec<Vec3>,
    uvs: &mut Vec<Vec2>,
    indices: &mut Vec<u32>,
) {
    let n = contour.len();
    let mut run = 0.0;
    for i in 0..n {
        let (a, b) = (contour[i], contour[(i + 1) % n]);
        let edge = b - a;
        let normal = Vec2::new(edge.y, -edge.x).normalize_or_zero().extend(0.0);
        let next_run = run + edge.length();
        let base = positions.len() as u32;
        for (p, z, u) in [(a, 0.0, run), (b, 0.0, next_run), (b, depth, next_run), (a, depth, run)] {
            positions.push(p.extend(z));
            normals.push(normal);
            uvs.push(Vec2::new(u, z));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        run = next_run;
    }
}
