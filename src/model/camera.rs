use glam::{Mat4, Vec3};

use crate::config::CameraSpec;

/// Perspective camera looking at `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(spec: &CameraSpec, aspect: f32) -> Self {
        Self {
            eye: spec.position,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: spec.fov_y_degrees.to_radians(),
            aspect,
            z_near: spec.z_near,
            z_far: spec.z_far,
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    fn camera() -> Camera {
        Camera::new(&SceneConfig::default().camera, 800.0 / 600.0)
    }

    #[test]
    fn starts_on_the_z_axis_looking_at_origin() {
        let cam = camera();
        assert_eq!(cam.eye, Vec3::new(0.0, 0.0, 5.0));
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!((cam.fov_y - 75f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn set_aspect_uses_width_over_height() {
        let mut cam = camera();
        cam.set_aspect(1920, 1080);
        assert_eq!(cam.aspect, 1920.0 / 1080.0);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let cam = camera();
        let clip = cam.view_proj() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
