use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::config::CameraOrbitSpec;
use crate::controller::input::{InputEvent, MouseButton};
use crate::model::Camera;

const POLAR_EPS: f32 = 1e-6;
const ZOOM_STEP: f32 = 0.95;

/// Damped orbit around `target`: left-drag rotates, wheel dollies.
///
/// Input only accumulates deltas; [`OrbitControls::update`] applies a
/// `damping_factor` share of them to the camera each tick and decays the rest.
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    drag_from: Option<Vec2>,
}

impl OrbitControls {
    pub fn new(damping_factor: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            drag_from: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Feed a pointer event; `viewport_height` is in the same units as the
    /// event coordinates.
    pub fn handle_event(&mut self, event: &InputEvent, viewport_height: f32) {
        match *event {
            InputEvent::PointerDown { button: MouseButton::Left, x, y } => {
                self.drag_from = Some(Vec2::new(x, y));
            }
            InputEvent::PointerMove { x, y } => {
                if let Some(from) = self.drag_from {
                    let to = Vec2::new(x, y);
                    let delta = (to - from) * self.rotate_speed;
                    let height = viewport_height.max(1.0);
                    self.rotate_left(2.0 * PI * delta.x / height);
                    self.rotate_up(2.0 * PI * delta.y / height);
                    self.drag_from = Some(to);
                }
            }
            InputEvent::PointerUp { button: MouseButton::Left } | InputEvent::FocusLost => {
                self.drag_from = None;
            }
            InputEvent::Wheel { delta_y } => self.dolly(delta_y),
            _ => {}
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    /// Negative `delta_y` (wheel up) moves the camera closer.
    pub fn dolly(&mut self, delta_y: f32) {
        let step = ZOOM_STEP.powf(self.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= step;
        } else if delta_y > 0.0 {
            self.scale /= step;
        }
    }

    /// Integrate pending deltas into the camera position. Returns whether the
    /// camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.eye - self.target;
        let radius = offset.length();

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 { (offset.y / radius).clamp(-1.0, 1.0).acos() } else { 0.0 };

        if self.enable_damping {
            theta += self.theta_delta * self.damping_factor;
            phi += self.phi_delta * self.damping_factor;
        } else {
            theta += self.theta_delta;
            phi += self.phi_delta;
        }
        phi = phi.clamp(POLAR_EPS, PI - POLAR_EPS);

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        let new_offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );

        let before = camera.eye;
        camera.eye = self.target + new_offset;
        camera.look_at(self.target);

        if self.enable_damping {
            self.theta_delta *= 1.0 - self.damping_factor;
            self.phi_delta *= 1.0 - self.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
        }
        self.scale = 1.0;

        before.distance_squared(camera.eye) > 1e-12
    }
}

/// Scripted slow orbit of the camera around the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOrbit {
    pub radius: f32,
    pub speed: f32,
}

impl CameraOrbit {
    /// Writes x and z; y is left to whatever the camera already has.
    pub fn apply(&self, camera: &mut Camera, t: f32) {
        let angle = self.speed * t;
        camera.eye.x = angle.sin() * self.radius;
        camera.eye.z = angle.cos() * self.radius;
    }
}

impl From<CameraOrbitSpec> for CameraOrbit {
    fn from(spec: CameraOrbitSpec) -> Self {
        Self { radius: spec.radius, speed: spec.speed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    fn camera() -> Camera {
        Camera::new(&SceneConfig::default().camera, 1.0)
    }

    #[test]
    fn idle_update_keeps_camera_still() {
        let mut controls = OrbitControls::new(0.05);
        let mut cam = camera();
        assert!(!controls.update(&mut cam));
        assert!(cam.eye.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
    }

    #[test]
    fn drag_rotation_is_damped_over_several_ticks() {
        let mut controls = OrbitControls::new(0.05);
        let mut cam = camera();
        controls.handle_event(&InputEvent::PointerDown { button: MouseButton::Left, x: 100.0, y: 100.0 }, 600.0);
        controls.handle_event(&InputEvent::PointerMove { x: 160.0, y: 100.0 }, 600.0);
        controls.handle_event(&InputEvent::PointerUp { button: MouseButton::Left }, 600.0);

        assert!(controls.update(&mut cam));
        let first_step = cam.eye;
        assert!(controls.update(&mut cam));
        // Still moving after release, distance to target preserved.
        assert!(cam.eye.distance(first_step) > 0.0);
        assert!((cam.eye.length() - 5.0).abs() < 1e-4);

        // Dragging right rotates the camera towards -x.
        assert!(cam.eye.x < 0.0);
    }

    #[test]
    fn damping_decays_towards_rest() {
        let mut controls = OrbitControls::new(0.05);
        let mut cam = camera();
        controls.rotate_left(1.0);
        for _ in 0..400 {
            controls.update(&mut cam);
        }
        let settled = cam.eye;
        controls.update(&mut cam);
        assert!(cam.eye.distance(settled) < 1e-5);
        // Total rotation converges to the full delta.
        let theta = cam.eye.x.atan2(cam.eye.z);
        assert!((theta + 1.0).abs() < 1e-3, "theta = {theta}");
    }

    #[test]
    fn without_damping_delta_applies_at_once() {
        let mut controls = OrbitControls::new(0.05);
        controls.enable_damping = false;
        let mut cam = camera();
        controls.rotate_left(-PI / 2.0);
        controls.update(&mut cam);
        assert!(cam.eye.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-4));
        assert!(!controls.update(&mut cam));
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let mut controls = OrbitControls::new(0.05);
        controls.enable_damping = false;
        let mut cam = camera();
        controls.rotate_up(10.0);
        controls.update(&mut cam);
        assert!(cam.eye.y <= 5.0 && cam.eye.y > 4.99);
        assert!(cam.forward().is_finite());
    }

    #[test]
    fn wheel_dollies_in_and_out() {
        let mut controls = OrbitControls::new(0.05);
        let mut cam = camera();
        controls.handle_event(&InputEvent::Wheel { delta_y: -1.0 }, 600.0);
        controls.update(&mut cam);
        assert!((cam.eye.length() - 4.75).abs() < 1e-4);

        controls.handle_event(&InputEvent::Wheel { delta_y: 1.0 }, 600.0);
        controls.update(&mut cam);
        assert!((cam.eye.length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn pointer_move_without_drag_is_ignored() {
        let mut controls = OrbitControls::new(0.05);
        let mut cam = camera();
        controls.handle_event(&InputEvent::PointerMove { x: 500.0, y: 20.0 }, 600.0);
        assert!(!controls.is_dragging());
        assert!(!controls.update(&mut cam));
    }

    #[test]
    fn scripted_orbit_starts_at_initial_camera_position() {
        let orbit = CameraOrbit { radius: 5.0, speed: 0.1 };
        let mut cam = camera();
        orbit.apply(&mut cam, 0.0);
        assert!(cam.eye.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-6));

        orbit.apply(&mut cam, 5.0 * PI);
        assert!(cam.eye.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-4));
    }
}
