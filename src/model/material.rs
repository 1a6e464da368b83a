use crate::config::{hex_to_rgb, SurfaceSpec};

/// Index of a [`ShaderState`](super::ShaderState) registered in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderStateId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMaterial {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub normal_mapped: bool,
}

impl From<SurfaceSpec> for StandardMaterial {
    fn from(spec: SurfaceSpec) -> Self {
        Self {
            color: hex_to_rgb(spec.color),
            metalness: spec.metalness,
            roughness: spec.roughness,
            normal_mapped: spec.normal_mapped,
        }
    }
}

/// Custom-program material; its uniforms live in a shared shader state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderMaterial {
    pub state: ShaderStateId,
    pub transparent: bool,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsMaterial {
    pub color: [f32; 3],
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Standard(StandardMaterial),
    Shader(ShaderMaterial),
    Points(PointsMaterial),
}

impl Material {
    pub fn shader_state(&self) -> Option<ShaderStateId> {
        match self {
            Material::Shader(m) => Some(m.state),
            _ => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Material::Shader(m) if m.transparent)
    }
}
