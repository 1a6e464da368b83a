use crate::model::{Camera, ViewportState};

/// Update viewport and camera for a new logical size. Returns the renderer's
/// new output size in physical pixels, or `None` if the notification was
/// ignored (zero-sized window).
pub fn apply_resize(
    viewport: &mut ViewportState,
    camera: &mut Camera,
    width: u32,
    height: u32,
    device_pixel_ratio: f32,
) -> Option<(u32, u32)> {
    if !viewport.resize(width, height, device_pixel_ratio) {
        return None;
    }
    camera.set_aspect(width, height);
    tracing::debug!(width, height, pixel_ratio = viewport.pixel_ratio, "viewport resized");
    Some(viewport.physical_size())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    fn setup() -> (ViewportState, Camera) {
        let config = SceneConfig::default();
        let viewport = ViewportState::new(800, 600, 1.0, config.max_pixel_ratio);
        let camera = Camera::new(&config.camera, viewport.aspect());
        (viewport, camera)
    }

    #[test]
    fn aspect_is_exactly_width_over_height() {
        let (mut viewport, mut camera) = setup();
        let out = apply_resize(&mut viewport, &mut camera, 1366, 768, 1.0);
        assert_eq!(camera.aspect, 1366.0 / 768.0);
        assert_eq!(out, Some((1366, 768)));
    }

    #[test]
    fn dense_displays_are_clamped() {
        let (mut viewport, mut camera) = setup();
        let out = apply_resize(&mut viewport, &mut camera, 400, 300, 3.0);
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(out, Some((800, 600)));
    }

    #[test]
    fn repeated_resize_is_idempotent() {
        let (mut viewport, mut camera) = setup();
        let a = apply_resize(&mut viewport, &mut camera, 1024, 512, 1.5);
        let snapshot = (viewport, camera);
        let b = apply_resize(&mut viewport, &mut camera, 1024, 512, 1.5);
        assert_eq!(a, b);
        assert_eq!(snapshot, (viewport, camera));
    }

    #[test]
    fn zero_size_leaves_camera_alone() {
        let (mut viewport, mut camera) = setup();
        let before = camera.aspect;
        assert_eq!(apply_resize(&mut viewport, &mut camera, 0, 0, 1.0), None);
        assert_eq!(camera.aspect, before);
    }
}
