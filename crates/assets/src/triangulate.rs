// Polygon triangulation: holes are bridged into the outer ring, then the
// ring is ear-clipped.

use glam::Vec2;

const EPS: f32 = 1e-9;

/// Triangles over a point list. Winding is counter-clockwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    pub points: Vec<Vec2>,
    pub triangles: Vec<[u32; 3]>,
}

fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

fn max_x(contour: &[Vec2]) -> f32 {
    contour.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max)
}

/// Proper intersection: the segments cross at a point interior to both.
fn segments_cross(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = cross(p2 - p1, q1 - p1);
    let d2 = cross(p2 - p1, q2 - p1);
    let d3 = cross(q2 - q1, p1 - q1);
    let d4 = cross(q2 - q1, p2 - q1);
    ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
}

fn in_triangle(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    cross(b - a, p - a) >= 0.0 && cross(c - b, p - b) >= 0.0 && cross(a - c, p - c) >= 0.0
}

/// Whether direction `d` from ring vertex `pos` points into the polygon
/// interior (the ring is counter-clockwise).
fn in_cone(points: &[Vec2], ring: &[usize], pos: usize, d: Vec2) -> bool {
    let n = ring.len();
    let a = points[ring[(pos + n - 1) % n]];
    let p = points[ring[pos]];
    let c = points[ring[(pos + 1) % n]];
    let left_of_in = cross(p - a, d) >= 0.0;
    let left_of_out = cross(c - p, d) >= 0.0;
    if cross(p - a, c - p) >= 0.0 {
        left_of_in && left_of_out
    } else {
        left_of_in || left_of_out
    }
}

/// Ring position to connect the hole vertex `m` to.
fn find_bridge(points: &[Vec2], ring: &[usize], m: Vec2, blockers: &[&[Vec2]]) -> usize {
    let mut candidates: Vec<usize> = (0..ring.len()).collect();
    candidates.sort_by(|a, b| {
        points[ring[*a]]
            .distance_squared(m)
            .total_cmp(&points[ring[*b]].distance_squared(m))
    });

    let n = ring.len();
    let visible = |pos: usize| {
        let p = points[ring[pos]];
        if !in_cone(points, ring, pos, m - p) {
            return false;
        }
        let ring_clear = (0..n).all(|k| {
            let (q1, q2) = (points[ring[k]], points[ring[(k + 1) % n]]);
            q1 == p || q2 == p || !segments_cross(p, m, q1, q2)
        });
        let holes_clear = blockers.iter().all(|hole| {
            let h = hole.len();
            (0..h).all(|k| {
                let (q1, q2) = (hole[k], hole[(k + 1) % h]);
                q1 == m || q2 == m || !segments_cross(p, m, q1, q2)
            })
        });
        ring_clear && holes_clear
    };

    candidates
        .iter()
        .copied()
        .find(|pos| visible(*pos))
        .unwrap_or(candidates[0])
}

/// Triangulate a polygon with holes. `outer` must be counter-clockwise and
/// every hole clockwise; contours with fewer than three points are ignored.
pub fn triangulate(outer: &[Vec2], holes: &[Vec<Vec2>]) -> Triangulation {
    if outer.len() < 3 {
        return Triangulation::default();
    }
    let mut points: Vec<Vec2> = outer.to_vec();
    let mut ring: Vec<usize> = (0..outer.len()).collect();

    let mut order: Vec<usize> = (0..holes.len()).filter(|i| holes[*i].len() >= 3).collect();
    order.sort_by(|a, b| max_x(&holes[*b]).total_cmp(&max_x(&holes[*a])));

    for (done, &h) in order.iter().enumerate() {
        let hole = &holes[h];
        let base = points.len();
        points.extend_from_slice(hole);

        let m = (0..hole.len())
            .max_by(|a, b| hole[*a].x.total_cmp(&hole[*b].x))
            .unwrap_or(0);
        let blockers: Vec<&[Vec2]> = order[done..]
            .iter()
            .map(|i| holes[*i].as_slice())
            .collect();
        let bridge = find_bridge(&points, &ring, hole[m], &blockers);

        let mut spliced = Vec::with_capacity(ring.len() + hole.len() + 2);
        spliced.extend_from_slice(&ring[..=bridge]);
        spliced.extend((0..=hole.len()).map(|k| base + (m + k) % hole.len()));
        spliced.extend_from_slice(&ring[bridge..]);
        ring = spliced;
    }

    let triangles = ear_clip(&points, ring);
    Triangulation { points, triangles }
}

fn ear_clip(points: &[Vec2], mut ring: Vec<usize>) -> Vec<[u32; 3]> {
    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));
    let mut start = 0;

    while ring.len() > 3 {
        let n = ring.len();
        let mut clipped = false;

        for k in 0..n {
            let pos = (start + k) % n;
            let (ia, ib, ic) = (ring[(pos + n - 1) % n], ring[pos], ring[(pos + 1) % n]);
            let (a, b, c) = (points[ia], points[ib], points[ic]);
            let turn = cross(b - a, c - b);

            if turn.abs() <= EPS {
                // Collinear or backtracking vertex: drop it, no area lost.
                ring.remove(pos);
                start = pos;
                clipped = true;
                break;
            }
            if turn < 0.0 {
                continue;
            }
            let blocked = ring.iter().any(|&j| {
                let p = points[j];
                p != a && p != b && p != c && in_triangle(a, b, c, p)
            });
            if blocked {
                continue;
            }
            triangles.push([ia as u32, ib as u32, ic as u32]);
            ring.remove(pos);
            start = pos;
            clipped = true;
            break;
        }

        if !clipped {
            // Self-intersecting input: force progress.
            let pos = start % n;
            triangles.push([
                ring[(pos + n - 1) % n] as u32,
                ring[pos] as u32,
                ring[(pos + 1) % n] as u32,
            ]);
            ring.remove(pos);
        }
    }

    if let [ia, ib, ic] = ring[..] {
        let (a, b, c) = (points[ia], points[ib], points[ic]);
        if cross(b - a, c - b) > EPS {
            triangles.push([ia as u32, ib as u32, ic as u32]);
        }
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(t: &Triangulation) -> f32 {
        t.triangles
            .iter()
            .map(|[a, b, c]| {
                let (a, b, c) = (t.points[*a as usize], t.points[*b as usize], t.points[*c as usize]);
                cross(b - a, c - a) * 0.5
            })
            .sum()
    }

    fn square(min: f32, max: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(min, min),
            Vec2::new(max, min),
            Vec2::new(max, max),
            Vec2::new(min, max),
        ]
    }

    #[test]
    fn square_gives_two_triangles() {
        let t = triangulate(&square(0.0, 1.0), &[]);
        assert_eq!(t.triangles.len(), 2);
        assert!((area(&t) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn concave_polygon_preserves_area() {
        // L shape, area 3
        let l = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let t = triangulate(&l, &[]);
        assert_eq!(t.triangles.len(), 4);
        assert!((area(&t) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn square_with_hole_subtracts_hole_area() {
        let mut hole = square(1.0, 2.0);
        hole.reverse();
        let t = triangulate(&square(0.0, 3.0), &[hole]);
        assert!((area(&t) - 8.0).abs() < 1e-4);
        assert!(t.triangles.iter().all(|tri| {
            let (a, b, c) = (
                t.points[tri[0] as usize],
                t.points[tri[1] as usize],
                t.points[tri[2] as usize],
            );
            cross(b - a, c - a) >= 0.0
        }));
    }

    #[test]
    fn two_holes() {
        let mut h1 = square(1.0, 2.0);
        h1.reverse();
        let mut h2: Vec<Vec2> = square(1.0, 2.0).iter().map(|p| *p + Vec2::new(2.0, 0.0)).collect();
        h2.reverse();
        let outer = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(5.0, 3.0),
            Vec2::new(0.0, 3.0),
        ];
        let t = triangulate(&outer, &[h1, h2]);
        assert!((area(&t) - 13.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_input_is_empty() {
        assert!(triangulate(&[Vec2::ZERO, Vec2::ONE], &[]).triangles.is_empty());
    }
}
