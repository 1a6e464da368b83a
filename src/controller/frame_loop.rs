use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::SceneConfig;
use crate::controller::frame_updater::update_frame;
use crate::controller::input::{InputEvent, InputState};
use crate::controller::orbit_controls::{CameraOrbit, OrbitControls};
use crate::controller::resize::apply_resize;
use crate::model::{clock, Camera, Clock, Scene, ViewportState};

/// Everything the frame loop mutates, owned in one place and handed to the
/// update and render steps explicitly.
pub struct SceneContext {
    pub config: SceneConfig,
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub camera_orbit: Option<CameraOrbit>,
    pub viewport: ViewportState,
    pub clock: Clock,
    pub input: InputState,
    pub stats: FrameStats,
}

impl SceneContext {
    /// Build the scene and start the clock. `width`/`height` are logical pixels.
    pub fn new(config: SceneConfig, width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        let seed = config.seed.unwrap_or_else(|| clock::now_seconds().to_bits() ^ 0x9e37_79b9_7f4a_7c15);
        let mut rng = SmallRng::seed_from_u64(seed);
        let scene = Scene::build(&config, &mut rng);

        let viewport = ViewportState::new(width.max(1), height.max(1), device_pixel_ratio, config.max_pixel_ratio);
        let camera = Camera::new(&config.camera, viewport.aspect());
        let controls = OrbitControls::new(config.camera.damping_factor);
        let camera_orbit = config
            .variant
            .uses_post_processing()
            .then(|| CameraOrbit::from(config.camera_orbit));

        tracing::info!(
            variant = config.variant.name(),
            seed,
            particles = config.particles.count,
            "scene context ready"
        );

        Self {
            config,
            scene,
            camera,
            controls,
            camera_orbit,
            viewport,
            clock: Clock::start(),
            input: InputState::new(),
            stats: FrameStats::default(),
        }
    }

    /// Run the frame updater for the current clock reading.
    pub fn update(&mut self) -> f32 {
        let elapsed = self.clock.elapsed();
        self.update_at(elapsed);
        elapsed
    }

    pub fn update_at(&mut self, elapsed: f32) {
        self.stats.record(elapsed);
        update_frame(
            &mut self.scene,
            &mut self.camera,
            &mut self.controls,
            self.camera_orbit.as_ref(),
            elapsed,
        );
    }

    /// See [`apply_resize`].
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) -> Option<(u32, u32)> {
        apply_resize(&mut self.viewport, &mut self.camera, width, height, device_pixel_ratio)
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        self.input.process_event(event);
        self.controls.handle_event(event, self.viewport.height as f32);
    }
}

/// Smoothed frame rate for the HUD.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub fps: f32,
    pub frames: u64,
    last_elapsed: Option<f32>,
}

impl FrameStats {
    pub fn record(&mut self, elapsed: f32) {
        if let Some(last) = self.last_elapsed {
            let dt = elapsed - last;
            if dt > 0.0 {
                let instant = 1.0 / dt;
                self.fps = if self.fps == 0.0 { instant } else { self.fps * 0.9 + instant * 0.1 };
            }
        }
        self.last_elapsed = Some(elapsed);
        self.frames += 1;
    }

    pub fn last_elapsed(&self) -> Option<f32> {
        self.last_elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use crate::controller::input::MouseButton;
    use glam::Vec3;

    fn context(variant: Variant) -> SceneContext {
        let mut config = SceneConfig::with_variant(variant);
        config.seed = Some(1);
        SceneContext::new(config, 800, 600, 1.0)
    }

    #[test]
    fn basic_variant_has_no_scripted_camera() {
        let ctx = context(Variant::Basic);
        assert!(ctx.camera_orbit.is_none());
        assert_eq!(ctx.camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn bloom_variant_orbits_camera() {
        let mut ctx = context(Variant::Bloom);
        assert!(ctx.camera_orbit.is_some());
        ctx.update_at(5.0 * std::f32::consts::PI);
        assert!(ctx.camera.eye.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-3));
    }

    #[test]
    fn seeded_contexts_build_identical_particles() {
        let a = context(Variant::Basic);
        let b = context(Variant::Basic);
        let positions = |ctx: &SceneContext| {
            ctx.scene
                .graph
                .geometries()
                .find_map(|(_, g)| match g {
                    crate::model::Geometry::Particles(field) => Some(field.positions.clone()),
                    _ => None,
                })
                .unwrap()
        };
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn input_reaches_controls_and_toggles() {
        let mut ctx = context(Variant::Basic);
        ctx.handle_input(&InputEvent::PointerDown { button: MouseButton::Left, x: 0.0, y: 0.0 });
        assert!(ctx.controls.is_dragging());
        ctx.handle_input(&InputEvent::KeyDown("h".into()));
        assert!(ctx.input.hud_visible);
    }

    #[test]
    fn resize_goes_through_viewport() {
        let mut ctx = context(Variant::Basic);
        assert_eq!(ctx.resize(1000, 500, 4.0), Some((2000, 1000)));
        assert_eq!(ctx.camera.aspect, 2.0);
    }

    #[test]
    fn fps_follows_frame_interval() {
        let mut stats = FrameStats::default();
        for i in 0..120 {
            stats.record(i as f32 / 60.0);
        }
        assert_eq!(stats.frames, 120);
        assert!((stats.fps - 60.0).abs() < 0.5, "fps = {}", stats.fps);
    }
}
