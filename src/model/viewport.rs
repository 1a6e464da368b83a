/// Size of the drawing area in logical (CSS) pixels plus the clamped
/// device pixel ratio used to size the renderer's output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    max_pixel_ratio: f32,
}

impl ViewportState {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32, max_pixel_ratio: f32) -> Self {
        let mut viewport = Self {
            width: 0,
            height: 0,
            pixel_ratio: 1.0,
            max_pixel_ratio,
        };
        viewport.resize(width, height, device_pixel_ratio);
        viewport
    }

    /// Returns `false` (and leaves the state untouched) for zero-sized input.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio, self.max_pixel_ratio);
        true
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Renderer output size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            ((self.width as f32 * self.pixel_ratio).round() as u32).max(1),
            ((self.height as f32 * self.pixel_ratio).round() as u32).max(1),
        )
    }
}

/// `min(dpr, max)`; non-finite or non-positive ratios count as 1.
pub fn clamp_pixel_ratio(device_pixel_ratio: f32, max: f32) -> f32 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(max)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_clamped_to_two() {
        let viewport = ViewportState::new(800, 600, 3.0, 2.0);
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(viewport.physical_size(), (1600, 1200));
    }

    #[test]
    fn low_density_ratio_passes_through() {
        let viewport = ViewportState::new(800, 600, 1.25, 2.0);
        assert_eq!(viewport.pixel_ratio, 1.25);
        assert_eq!(viewport.physical_size(), (1000, 750));
    }

    #[test]
    fn zero_size_resize_is_ignored() {
        let mut viewport = ViewportState::new(800, 600, 1.0, 2.0);
        assert!(!viewport.resize(0, 600, 1.0));
        assert_eq!((viewport.width, viewport.height), (800, 600));
    }

    #[test]
    fn bogus_ratio_falls_back_to_one() {
        assert_eq!(clamp_pixel_ratio(f32::NAN, 2.0), 1.0);
        assert_eq!(clamp_pixel_ratio(0.0, 2.0), 1.0);
    }
}
