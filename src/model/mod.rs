// MODEL: Scene data, pure of any GPU or host state
pub mod camera;
pub mod clock;
pub mod geometry;
pub mod material;
pub mod orbit;
pub mod scene;
pub mod scene_graph;
pub mod shader_state;
pub mod viewport;

pub use camera::Camera;
pub use clock::Clock;
pub use geometry::{Geometry, GeometryId, ParticleField};
pub use material::{Material, PointsMaterial, ShaderMaterial, ShaderStateId, StandardMaterial};
pub use orbit::OrbitParameters;
pub use scene::{OrbitingBody, Scene};
pub use scene_graph::{MaterialId, NodeId, NodeKind, PointLight, SceneGraph, SceneNode, Transform};
pub use shader_state::{ShaderState, UniformValue, RESOLUTION_UNIFORM, TIME_UNIFORM};
pub use viewport::ViewportState;
