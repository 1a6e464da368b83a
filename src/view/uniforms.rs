use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::model::{
    Camera, PointLight, PointsMaterial, ShaderState, StandardMaterial, RESOLUTION_UNIFORM, TIME_UNIFORM,
};

pub const MAX_LIGHTS: usize = 4;

/// Material colours are authored in sRGB; shading happens in linear space.
pub fn srgb_to_linear(rgb: [f32; 3]) -> [f32; 4] {
    let channel = |c: f32| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(rgb[0]), channel(rgb[1]), channel(rgb[2]), 1.0]
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, Default)]
pub struct LightUniform {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub _pad: f32,
}

/// Group 0: camera and lights, written once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
    pub light_count: u32,
    pub _pad: [u32; 3],
}

impl FrameUniform {
    /// Lights past [`MAX_LIGHTS`] are dropped with a warning.
    pub fn new(camera: &Camera, lights: &[(Vec3, PointLight)]) -> Self {
        if lights.len() > MAX_LIGHTS {
            tracing::warn!(count = lights.len(), max = MAX_LIGHTS, "too many point lights, extra ones ignored");
        }

        let mut packed = [LightUniform::default(); MAX_LIGHTS];
        for (slot, (position, light)) in packed.iter_mut().zip(lights) {
            *slot = LightUniform {
                position: position.to_array(),
                intensity: light.intensity,
                color: light.color,
                _pad: 0.0,
            };
        }

        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            camera_pos: camera.eye.extend(1.0).to_array(),
            lights: packed,
            light_count: lights.len().min(MAX_LIGHTS) as u32,
            _pad: [0; 3],
        }
    }
}

/// Group 1: one per drawable node.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
}

impl From<Mat4> for ModelUniform {
    fn from(m: Mat4) -> Self {
        Self { model: m.to_cols_array_2d() }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct StandardUniform {
    pub color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub normal_scale: f32,
    /// 1.0 samples the normal map, 0.0 uses the vertex normal
    pub use_normal_map: f32,
}

impl From<&StandardMaterial> for StandardUniform {
    fn from(m: &StandardMaterial) -> Self {
        Self {
            color: srgb_to_linear(m.color),
            metalness: m.metalness,
            roughness: m.roughness,
            normal_scale: 1.0,
            use_normal_map: if m.normal_mapped { 1.0 } else { 0.0 },
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlowUniform {
    pub time: f32,
    pub opacity: f32,
    pub resolution: [f32; 2],
}

impl GlowUniform {
    /// Missing uniforms read as zero.
    pub fn from_state(state: &ShaderState, opacity: f32) -> Self {
        Self {
            time: state.float(TIME_UNIFORM).unwrap_or(0.0),
            opacity,
            resolution: state.vec2(RESOLUTION_UNIFORM).unwrap_or_default().to_array(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PointsUniform {
    pub color: [f32; 4],
}

impl From<&PointsMaterial> for PointsUniform {
    fn from(m: &PointsMaterial) -> Self {
        Self { color: srgb_to_linear(m.color) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::model::UniformValue;
    use glam::Vec2;

    #[test]
    fn uniform_sizes_match_wgsl_layouts() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 32);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 224);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 64);
        assert_eq!(std::mem::size_of::<StandardUniform>(), 32);
        assert_eq!(std::mem::size_of::<GlowUniform>(), 16);
        assert_eq!(std::mem::size_of::<PointsUniform>(), 16);
    }

    #[test]
    fn frame_uniform_packs_lights() {
        let camera = Camera::new(&SceneConfig::default().camera, 1.5);
        let lights = [
            (Vec3::new(2.0, 3.0, 4.0), PointLight { color: [1.0, 1.0, 1.0], intensity: 0.3 }),
            (Vec3::ZERO, PointLight { color: [1.0, 0.0, 0.0], intensity: 2.0 }),
        ];
        let u = FrameUniform::new(&camera, &lights);
        assert_eq!(u.light_count, 2);
        assert_eq!(u.lights[0].position, [2.0, 3.0, 4.0]);
        assert_eq!(u.lights[1].intensity, 2.0);
        assert_eq!(u.lights[2].intensity, 0.0);
        assert_eq!(u.camera_pos, [0.0, 0.0, 5.0, 1.0]);
    }

    #[test]
    fn extra_lights_are_dropped() {
        let camera = Camera::new(&SceneConfig::default().camera, 1.0);
        let light = (Vec3::ONE, PointLight { color: [1.0; 3], intensity: 1.0 });
        let u = FrameUniform::new(&camera, &[light; 6]);
        assert_eq!(u.light_count, MAX_LIGHTS as u32);
    }

    #[test]
    fn glow_uniform_reads_shader_state() {
        let mut state = ShaderState::timed();
        state.set(TIME_UNIFORM, UniformValue::Float(2.5));
        let u = GlowUniform::from_state(&state, 0.5);
        assert_eq!(u.time, 2.5);
        assert_eq!(u.opacity, 0.5);
        assert_eq!(u.resolution, [0.0, 0.0]);

        state.set(RESOLUTION_UNIFORM, UniformValue::Vec2(Vec2::new(800.0, 600.0)));
        assert_eq!(GlowUniform::from_state(&state, 0.5).resolution, [800.0, 600.0]);
        assert_eq!(GlowUniform::from_state(&ShaderState::new(), 1.0).time, 0.0);
    }

    #[test]
    fn standard_uniform_flags_normal_map() {
        let config = SceneConfig::default();
        let large = StandardUniform::from(&StandardMaterial::from(config.large_surface));
        assert_eq!(large.use_normal_map, 1.0);
        assert_eq!(large.metalness, 1.0);
        let inner = StandardUniform::from(&StandardMaterial::from(config.inner_surfaces[1]));
        assert_eq!(inner.use_normal_map, 1.0);
        assert!(inner.color[1] < 215.0 / 255.0);
    }

    #[test]
    fn srgb_endpoints_are_fixed() {
        assert_eq!(srgb_to_linear([0.0, 1.0, 0.0]), [0.0, 1.0, 0.0, 1.0]);
        let mid = srgb_to_linear([0.5; 3])[0];
        assert!((mid - 0.214).abs() < 1e-3);
    }
}
