// Glyph outline commands and flattening into polyline contours.

use glam::Vec2;

use crate::error::AssetError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    /// Control point, end point.
    QuadraticTo(Vec2, Vec2),
    /// Control point 1, control point 2, end point.
    CubicTo(Vec2, Vec2, Vec2),
    Close,
}

/// Parse a typeface outline string such as `"m 0 0 l 10 0 q 20 10 15 0"`.
///
/// Curve operands list the end point first: `q x y cpx cpy` and
/// `b x y c1x c1y c2x c2y`.
pub fn parse_outline(outline: &str) -> Result<Vec<PathCommand>, AssetError> {
    let tokens: Vec<&str> = outline.split_whitespace().collect();
    let mut commands = Vec::new();
    let mut i = 0;

    let read = |at: usize| -> Result<f32, AssetError> {
        let token = tokens.get(at).ok_or_else(|| AssetError::Outline {
            index: at,
            message: "unexpected end of outline".into(),
        })?;
        token.parse::<f32>().map_err(|e| AssetError::Outline {
            index: at,
            message: format!("bad number {token:?}: {e}"),
        })
    };
    let point = |at: usize| -> Result<Vec2, AssetError> { Ok(Vec2::new(read(at)?, read(at + 1)?)) };

    while i < tokens.len() {
        match tokens[i] {
            "m" => {
                commands.push(PathCommand::MoveTo(point(i + 1)?));
                i += 3;
            }
            "l" => {
                commands.push(PathCommand::LineTo(point(i + 1)?));
                i += 3;
            }
            "q" => {
                let end = point(i + 1)?;
                let ctrl = point(i + 3)?;
                commands.push(PathCommand::QuadraticTo(ctrl, end));
                i += 5;
            }
            "b" => {
                let end = point(i + 1)?;
                let c1 = point(i + 3)?;
                let c2 = point(i + 5)?;
                commands.push(PathCommand::CubicTo(c1, c2, end));
                i += 7;
            }
            "z" => {
                commands.push(PathCommand::Close);
                i += 1;
            }
            other => {
                return Err(AssetError::Outline {
                    index: i,
                    message: format!("unknown command {other:?}"),
                });
            }
        }
    }
    Ok(commands)
}

fn quadratic(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let mt = 1.0 - t;
    p0 * (mt * mt) + p1 * (2.0 * mt * t) + p2 * (t * t)
}

fn cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let mt = 1.0 - t;
    p0 * (mt * mt * mt) + p1 * (3.0 * mt * mt * t) + p2 * (3.0 * mt * t * t) + p3 * (t * t * t)
}

/// Flatten commands into closed polyline contours, one per `MoveTo`.
///
/// Each curve contributes `segments` points. Points are mapped through
/// `p * scale + offset`. The closing duplicate of a contour's first point
/// and consecutive duplicates are dropped; contours with fewer than three
/// points are discarded.
pub fn flatten(commands: &[PathCommand], segments: usize, scale: f32, offset: Vec2) -> Vec<Vec<Vec2>> {
    let segments = segments.max(1);
    let mut contours: Vec<Vec<Vec2>> = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();
    let mut pen = Vec2::ZERO;

    let push = |contour: &mut Vec<Vec2>, p: Vec2| {
        let p = p * scale + offset;
        if contour.last().is_none_or(|last| last.distance_squared(p) > 1e-12) {
            contour.push(p);
        }
    };

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                if !current.is_empty() {
                    contours.push(std::mem::take(&mut current));
                }
                push(&mut current, p);
                pen = p;
            }
            PathCommand::LineTo(p) => {
                push(&mut current, p);
                pen = p;
            }
            PathCommand::QuadraticTo(ctrl, end) => {
                for s in 1..=segments {
                    let t = s as f32 / segments as f32;
                    push(&mut current, quadratic(pen, ctrl, end, t));
                }
                pen = end;
            }
            PathCommand::CubicTo(c1, c2, end) => {
                for s in 1..=segments {
                    let t = s as f32 / segments as f32;
                    push(&mut current, cubic(pen, c1, c2, end, t));
                }
                pen = end;
            }
            PathCommand::Close => {
                if !current.is_empty() {
                    contours.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        contours.push(current);
    }

    for contour in &mut contours {
        if contour.len() > 1 {
            let (first, last) = (contour[0], contour[contour.len() - 1]);
            if first.distance_squared(last) <= 1e-12 {
                contour.pop();
            }
        }
    }
    contours.retain(|c| c.len() >= 3);
    contours
}

/// Signed area, positive for counter-clockwise contours (y up).
pub fn signed_area(contour: &[Vec2]) -> f32 {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        * 0.5
}

/// Even-odd point-in-polygon test.
pub fn contains_point(contour: &[Vec2], p: Vec2) -> bool {
    let n = contour.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (contour[i], contour[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_commands() {
        let cmds = parse_outline("m 0 0 l 10 0 q 20 10 15 5 b 0 10 1 2 3 4 z").unwrap();
        assert_eq!(cmds.len(), 5);
        assert_eq!(cmds[0], PathCommand::MoveTo(Vec2::ZERO));
        // end point first in the source, control point first in the command
        assert_eq!(
            cmds[2],
            PathCommand::QuadraticTo(Vec2::new(15.0, 5.0), Vec2::new(20.0, 10.0))
        );
        assert_eq!(
            cmds[3],
            PathCommand::CubicTo(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), Vec2::new(0.0, 10.0))
        );
        assert_eq!(cmds[4], PathCommand::Close);
    }

    #[test]
    fn rejects_truncated_and_unknown() {
        assert!(matches!(
            parse_outline("m 0"),
            Err(AssetError::Outline { index: 2, .. })
        ));
        assert!(matches!(
            parse_outline("x 1 2"),
            Err(AssetError::Outline { index: 0, .. })
        ));
        assert!(parse_outline("m 0 zero").is_err());
    }

    #[test]
    fn empty_outline_is_empty() {
        assert!(parse_outline("   ").unwrap().is_empty());
    }

    #[test]
    fn flatten_splits_contours_and_drops_closing_point() {
        let cmds = parse_outline("m 0 0 l 10 0 l 10 10 l 0 0 m 20 0 l 30 0 l 30 10").unwrap();
        let contours = flatten(&cmds, 12, 1.0, Vec2::ZERO);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].len(), 3);
        assert_eq!(contours[1].len(), 3);
    }

    #[test]
    fn flatten_applies_scale_offset_and_curve_segments() {
        let cmds = parse_outline("m 0 0 q 100 0 50 50 l 50 -50").unwrap();
        let contours = flatten(&cmds, 12, 0.01, Vec2::new(1.0, 0.0));
        assert_eq!(contours[0].len(), 1 + 12 + 1);
        assert_eq!(contours[0][0], Vec2::new(1.0, 0.0));
        assert!((contours[0][12] - Vec2::new(2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn area_and_containment() {
        let square = [Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::ONE, Vec2::new(0.0, 1.0)];
        assert!((signed_area(&square) - 1.0).abs() < 1e-6);
        let reversed: Vec<Vec2> = square.iter().rev().copied().collect();
        assert!(signed_area(&reversed) < 0.0);
        assert!(contains_point(&square, Vec2::splat(0.5)));
        assert!(!contains_point(&square, Vec2::splat(1.5)));
    }
}
