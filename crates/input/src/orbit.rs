use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Vec2, Vec3};
use tableau_common::Viewport;
use tableau_scene::PerspectiveCamera;
use tracing::trace;

use crate::action::{Action, PointerButton};

/// Limits applied to the orbit after every update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitBounds {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Elevation above the target's horizontal plane, radians.
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for OrbitBounds {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_pitch: -FRAC_PI_2 + 1e-4,
            max_pitch: FRAC_PI_2 - 1e-4,
        }
    }
}

/// Orbit camera controller: primary drag rotates around the target,
/// secondary drag pans, the wheel dollies in and out.
///
/// Input handlers only accumulate deltas; [`OrbitControls::update`] applies
/// them to a camera and re-aims it at the target.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub bounds: OrbitBounds,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    /// Distance factor per wheel line (dolly in multiplies, out divides).
    pub zoom_step: f32,
    pub enabled: bool,
    viewport: Viewport,
    drag: Option<PointerButton>,
    last_pointer: Option<Vec2>,
    yaw_delta: f32,
    pitch_delta: f32,
    pan_pixels: Vec2,
    scale: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3, viewport: Viewport) -> Self {
        Self {
            target,
            bounds: OrbitBounds::default(),
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_step: 0.95,
            enabled: true,
            viewport,
            drag: None,
            last_pointer: None,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            pan_pixels: Vec2::ZERO,
            scale: 1.0,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn pointer_down(&mut self, button: PointerButton) {
        if self.enabled && button != PointerButton::Middle {
            self.drag = Some(button);
        }
    }

    pub fn pointer_up(&mut self, button: PointerButton) {
        if self.drag == Some(button) {
            self.drag = None;
        }
    }

    /// Track the pointer; while dragging, accumulate rotation or pan.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let pos = Vec2::new(x, y);
        let delta = self.last_pointer.map_or(Vec2::ZERO, |last| pos - last);
        self.last_pointer = Some(pos);
        if !self.enabled {
            return;
        }
        // A full-height drag turns the camera once around.
        let h = self.viewport.height.max(1) as f32;
        match self.drag {
            Some(PointerButton::Primary) => {
                self.yaw_delta -= TAU * delta.x / h * self.rotate_speed;
                self.pitch_delta += TAU * delta.y / h * self.rotate_speed;
            }
            Some(PointerButton::Secondary) => self.pan_pixels += delta,
            _ => {}
        }
    }

    /// Positive `lines` dolly out, negative dolly in.
    pub fn wheel(&mut self, lines: f32) {
        if self.enabled && lines != 0.0 {
            self.scale *= self.zoom_step.powf(-lines);
        }
    }

    /// Feed an action. Returns `true` if the action is one the controls use.
    pub fn handle(&mut self, action: &Action) -> bool {
        match *action {
            Action::PointerDown(b) => self.pointer_down(b),
            Action::PointerUp(b) => self.pointer_up(b),
            Action::PointerMove { x, y } => self.pointer_move(x, y),
            Action::Wheel(lines) => self.wheel(lines),
            Action::Resize(v) => self.set_viewport(v),
            Action::ScaleFactor(_) | Action::Noop => return false,
        }
        true
    }

    /// Apply pending input to `camera` and aim it at the target. Returns
    /// `true` if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let distance = offset.length().max(1e-6);
        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();

        yaw += self.yaw_delta;
        pitch = (pitch + self.pitch_delta).clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        let distance = (distance * self.scale).clamp(self.bounds.min_distance.max(1e-6), self.bounds.max_distance);

        if self.pan_pixels != Vec2::ZERO {
            // Pixels to world units at the target's depth.
            let h = self.viewport.height.max(1) as f32;
            let world_per_pixel = 2.0 * distance * (camera.fov.to_radians() * 0.5).tan() / h;
            let pan = (-camera.right() * self.pan_pixels.x + camera.up() * self.pan_pixels.y)
                * world_per_pixel
                * self.pan_speed;
            self.target += pan;
        }

        let eye = self.target
            + Vec3::new(
                distance * yaw.sin() * pitch.cos(),
                distance * pitch.sin(),
                distance * yaw.cos() * pitch.cos(),
            );
        let moved = eye.distance(camera.position) > 1e-4;
        camera.position = eye;
        camera.look_at(self.target);

        if moved {
            trace!(?eye, target = ?self.target, "orbit camera moved");
        }
        self.yaw_delta = 0.0;
        self.pitch_delta = 0.0;
        self.pan_pixels = Vec2::ZERO;
        self.scale = 1.0;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(35.0, 800.0 / 600.0, 0.1, 100.0);
        cam.position = Vec3::new(-4.0, 4.0, 10.0);
        cam
    }

    fn controls() -> OrbitControls {
        OrbitControls::new(Vec3::ZERO, Viewport::new(800, 600))
    }

    #[test]
    fn update_without_input_aims_at_target() {
        let mut cam = camera();
        let before = cam.position;
        let mut c = controls();
        assert!(!c.update(&mut cam));
        assert!((cam.position - before).length() < 1e-4);
        let expected = (-before).normalize();
        assert!((cam.forward() - expected).length() < 1e-4);
    }

    #[test]
    fn primary_drag_rotates_keeping_distance() {
        let mut cam = camera();
        let distance = cam.position.length();
        let mut c = controls();
        c.handle(&Action::PointerMove { x: 100.0, y: 100.0 });
        c.handle(&Action::PointerDown(PointerButton::Primary));
        c.handle(&Action::PointerMove { x: 250.0, y: 100.0 });
        assert!(c.update(&mut cam));
        assert!((cam.position.length() - distance).abs() < 1e-3);
        c.handle(&Action::PointerUp(PointerButton::Primary));
        assert!(!c.is_dragging());
    }

    #[test]
    fn move_without_drag_does_nothing() {
        let mut cam = camera();
        let mut c = controls();
        c.pointer_move(0.0, 0.0);
        c.pointer_move(300.0, 300.0);
        assert!(!c.update(&mut cam));
    }

    #[test]
    fn wheel_dollies_and_respects_bounds() {
        let mut cam = camera();
        let distance = cam.position.length();
        let mut c = controls();
        c.wheel(-1.0);
        c.update(&mut cam);
        assert!((cam.position.length() - distance * 0.95).abs() < 1e-3);

        c.bounds.max_distance = 5.0;
        c.wheel(10.0);
        c.update(&mut cam);
        assert!((cam.position.length() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped_below_the_pole() {
        let mut cam = camera();
        let mut c = controls();
        c.pointer_move(0.0, 0.0);
        c.pointer_down(PointerButton::Primary);
        c.pointer_move(0.0, 6000.0);
        c.update(&mut cam);
        assert!(cam.position.y > 0.0);
        assert!(cam.forward().is_finite());
        assert!(cam.position.x.abs() + cam.position.z.abs() > 0.0);
    }

    #[test]
    fn secondary_drag_pans_target() {
        let mut cam = camera();
        let mut c = controls();
        c.pointer_move(400.0, 300.0);
        c.pointer_down(PointerButton::Secondary);
        c.pointer_move(500.0, 300.0);
        c.update(&mut cam);
        assert!(c.target.length() > 0.0);
        assert!(c.target.y.abs() < 1e-4);
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let mut cam = camera();
        let mut c = controls();
        c.enabled = false;
        c.pointer_down(PointerButton::Primary);
        c.pointer_move(10.0, 10.0);
        c.wheel(5.0);
        assert!(!c.is_dragging());
        assert!(!c.update(&mut cam));
    }
}
