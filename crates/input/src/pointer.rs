use glam::Vec2;
use tableau_common::Viewport;

/// Map a pointer position in logical pixels (origin top-left, y down) to
/// normalized device coordinates (origin center, x right, y up, both in
/// [-1, 1]). Positions outside the surface are clamped to its edge.
pub fn pointer_to_ndc(x: f32, y: f32, viewport: Viewport) -> Vec2 {
    let w = viewport.width.max(1) as f32;
    let h = viewport.height.max(1) as f32;
    Vec2::new((x / w) * 2.0 - 1.0, -(y / h) * 2.0 + 1.0).clamp(Vec2::NEG_ONE, Vec2::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VP: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn center_maps_to_origin() {
        assert_eq!(pointer_to_ndc(400.0, 300.0, VP), Vec2::ZERO);
    }

    #[test]
    fn corners_map_with_y_up() {
        assert_eq!(pointer_to_ndc(0.0, 0.0, VP), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(800.0, 600.0, VP), Vec2::new(1.0, -1.0));
        assert_eq!(pointer_to_ndc(800.0, 0.0, VP), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn outside_positions_clamp() {
        assert_eq!(pointer_to_ndc(-50.0, 900.0, VP), Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn zero_viewport_does_not_divide_by_zero() {
        let p = pointer_to_ndc(0.0, 0.0, Viewport::new(0, 0));
        assert!(p.is_finite());
    }
}
