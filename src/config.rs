//! Scene constants and variant selection.
//!
//! Everything here is fixed at startup. The only runtime inputs are the
//! variant (`basic` / `bloom`) and an optional particle seed, read from the
//! environment natively or from the page query string in the browser.

use std::f32::consts::PI;

use glam::Vec3;

/// Which presentation route the scene uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Scene rendered straight into the surface.
    #[default]
    Basic,
    /// Scene routed through the bloom post-processing pipeline, camera auto-orbits.
    Bloom,
}

impl Variant {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" | "plain" | "" => Some(Variant::Basic),
            "bloom" => Some(Variant::Bloom),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Variant::Basic => "basic",
            Variant::Bloom => "bloom",
        }
    }

    pub fn uses_post_processing(self) -> bool {
        self == Variant::Bloom
    }
}

/// Parameters of a tessellated sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSpec {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

/// Metal/rough surface parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSpec {
    pub color: u32,
    pub metalness: f32,
    pub roughness: f32,
    pub normal_mapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpec {
    pub count: usize,
    pub scale: f32,
    pub size: f32,
    pub color: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSpec {
    pub radius: f32,
    pub speed: f32,
    pub inclination: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpec {
    pub color: u32,
    pub intensity: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSpec {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub position: Vec3,
    pub damping_factor: f32,
}

/// Scripted camera orbit used by the bloom variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOrbitSpec {
    pub radius: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSpec {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub variant: Variant,
    pub seed: Option<u64>,

    pub large_sphere: SphereSpec,
    pub large_surface: SurfaceSpec,
    /// Radians per second of the large sphere's spin about Y.
    pub large_spin_speed: f32,

    pub small_sphere: SphereSpec,
    pub small_opacity: f32,
    pub inner_sphere: SphereSpec,
    pub inner_surfaces: [SurfaceSpec; 2],

    pub particles: ParticleSpec,
    pub orbits: [OrbitSpec; 2],
    pub lights: [LightSpec; 2],

    pub camera: CameraSpec,
    pub camera_orbit: CameraOrbitSpec,
    pub bloom: BloomSpec,

    pub max_pixel_ratio: f32,
    pub normal_map_path: &'static str,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let metal = |color| SurfaceSpec {
            color,
            metalness: 1.0,
            roughness: 0.5,
            normal_mapped: true,
        };

        Self {
            variant: Variant::Basic,
            seed: None,

            large_sphere: SphereSpec { radius: 0.7, width_segments: 64, height_segments: 64 },
            large_surface: metal(0xffffff),
            large_spin_speed: 0.1,

            small_sphere: SphereSpec { radius: 0.1, width_segments: 32, height_segments: 32 },
            small_opacity: 0.5,
            inner_sphere: SphereSpec { radius: 0.098, width_segments: 32, height_segments: 32 },
            inner_surfaces: [metal(0xffffff), metal(0xffd700)],

            particles: ParticleSpec {
                count: 15_000,
                scale: 25.0,
                size: 0.005,
                color: 0x0000ff,
            },
            orbits: [
                OrbitSpec { radius: 1.0, speed: 1.0, inclination: PI / 2.0 },
                OrbitSpec { radius: 1.0, speed: -1.0, inclination: -PI / 6.0 },
            ],
            lights: [
                LightSpec { color: 0xffffff, intensity: 0.3, position: Vec3::new(2.0, 3.0, 4.0) },
                LightSpec { color: 0xff0000, intensity: 2.0, position: Vec3::ZERO },
            ],

            camera: CameraSpec {
                fov_y_degrees: 75.0,
                z_near: 0.1,
                z_far: 100.0,
                position: Vec3::new(0.0, 0.0, 5.0),
                damping_factor: 0.05,
            },
            camera_orbit: CameraOrbitSpec { radius: 5.0, speed: 0.1 },
            bloom: BloomSpec { strength: 1.5, radius: 0.4, threshold: 0.85 },

            max_pixel_ratio: 2.0,
            normal_map_path: "static/textures/NormalMap.png",
        }
    }
}

impl SceneConfig {
    pub fn with_variant(variant: Variant) -> Self {
        Self { variant, ..Self::default() }
    }

    /// Apply `key=value` pairs from a URL query string (`?variant=bloom&seed=7`).
    pub fn apply_query(&mut self, query: &str) {
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            self.apply_setting(key, value);
        }
    }

    /// Read `ORBSCENE_VARIANT` and `ORBSCENE_SEED`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("ORBSCENE_VARIANT") {
            self.apply_setting("variant", &value);
        }
        if let Ok(value) = std::env::var("ORBSCENE_SEED") {
            self.apply_setting("seed", &value);
        }
    }

    fn apply_setting(&mut self, key: &str, value: &str) {
        match key {
            "variant" => match Variant::parse(value) {
                Some(variant) => self.variant = variant,
                None => tracing::warn!(value, "unknown variant, keeping {}", self.variant.name()),
            },
            "seed" => match value.parse::<u64>() {
                Ok(seed) => self.seed = Some(seed),
                Err(_) => tracing::warn!(value, "ignoring non-numeric seed"),
            },
            _ => {}
        }
    }
}

/// `0xRRGGBB` → sRGB channel floats in `0..=1`.
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}
