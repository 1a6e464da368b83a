use glam::Vec3;
use rand::Rng;

use crate::config::{hex_to_rgb, SceneConfig};

use super::geometry::{Geometry, ParticleField};
use super::material::{Material, PointsMaterial, ShaderMaterial, ShaderStateId, StandardMaterial};
use super::orbit::OrbitParameters;
use super::scene_graph::{NodeId, NodeKind, PointLight, SceneGraph, Transform};
use super::shader_state::ShaderState;

/// A node moved along an orbit every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitingBody {
    pub node: NodeId,
    pub orbit: OrbitParameters,
}

/// The built scene plus handles to the nodes the frame updater animates.
#[derive(Debug, Clone)]
pub struct Scene {
    pub graph: SceneGraph,
    pub large_sphere: NodeId,
    pub orbiting: Vec<OrbitingBody>,
    pub particles: NodeId,
    pub glow_state: ShaderStateId,
    pub large_spin_speed: f32,
}

impl Scene {
    /// Build the full node tree from the fixed constants in `config`.
    pub fn build<R: Rng + ?Sized>(config: &SceneConfig, rng: &mut R) -> Self {
        let mut graph = SceneGraph::new();

        // Geometry
        let large_geometry = graph.add_geometry(Geometry::Sphere(config.large_sphere));
        let small_geometry = graph.add_geometry(Geometry::Sphere(config.small_sphere));
        let inner_geometry = graph.add_geometry(Geometry::Sphere(config.inner_sphere));

        let field = ParticleField::sample(config.particles.count, config.particles.scale, rng);
        let particle_geometry = graph.add_geometry(Geometry::Particles(field));

        // Materials; both small spheres share one shader material and its state
        let large_material = graph.add_material(Material::Standard(config.large_surface.into()));
        let inner_materials = config
            .inner_surfaces
            .map(|surface| graph.add_material(Material::Standard(StandardMaterial::from(surface))));

        let glow_state = graph.register_shader_state(ShaderState::timed());
        let glow_material = graph.add_material(Material::Shader(ShaderMaterial {
            state: glow_state,
            transparent: true,
            opacity: config.small_opacity,
        }));

        let particle_material = graph.add_material(Material::Points(PointsMaterial {
            color: hex_to_rgb(config.particles.color),
            size: config.particles.size,
        }));

        // Nodes
        let large_sphere = graph.add_root(
            "large_sphere",
            NodeKind::Mesh { geometry: large_geometry, material: large_material },
            Transform::default(),
        );

        let mut orbiting = Vec::with_capacity(config.orbits.len());
        for (i, (orbit, inner_material)) in config.orbits.iter().zip(inner_materials).enumerate() {
            let small = graph.add_root(
                &format!("small_sphere_{}", i + 1),
                NodeKind::Mesh { geometry: small_geometry, material: glow_material },
                Transform::default(),
            );
            graph.add_child(
                small,
                &format!("inner_small_sphere_{}", i + 1),
                NodeKind::Mesh { geometry: inner_geometry, material: inner_material },
                Transform::default(),
            );
            orbiting.push(OrbitingBody { node: small, orbit: OrbitParameters::from(*orbit) });
        }

        let particles = graph.add_root(
            "particles",
            NodeKind::Points { geometry: particle_geometry, material: particle_material },
            Transform::default(),
        );

        for (i, light) in config.lights.iter().enumerate() {
            graph.add_root(
                &format!("point_light_{}", i + 1),
                NodeKind::PointLight(PointLight {
                    color: hex_to_rgb(light.color),
                    intensity: light.intensity,
                }),
                Transform::at(light.position),
            );
        }

        tracing::debug!(
            nodes = graph.len(),
            particles = config.particles.count,
            "scene graph built"
        );

        Self {
            graph,
            large_sphere,
            orbiting,
            particles,
            glow_state,
            large_spin_speed: config.large_spin_speed,
        }
    }

    pub fn position_of(&self, node: NodeId) -> Vec3 {
        self.graph.node(node).transform.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::material::Material;
    use crate::model::shader_state::TIME_UNIFORM;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn build() -> Scene {
        Scene::build(&SceneConfig::default(), &mut SmallRng::seed_from_u64(11))
    }

    #[test]
    fn builds_expected_topology() {
        let scene = build();
        let graph = &scene.graph;
        // large sphere, 2 small + 2 inner, particles, 2 lights
        assert_eq!(graph.len(), 8);
        assert_eq!(graph.roots().len(), 6);
        assert_eq!(scene.orbiting.len(), 2);

        for body in &scene.orbiting {
            let children = graph.node(body.node).children();
            assert_eq!(children.len(), 1);
            assert!(graph.node(children[0]).name.starts_with("inner_small_sphere"));
        }
    }

    #[test]
    fn shared_shader_material_registers_one_state() {
        let scene = build();
        assert_eq!(scene.graph.shader_states().len(), 1);
        assert!(scene.graph.shader_state(scene.glow_state).has_time());
        assert_eq!(scene.graph.shader_state(scene.glow_state).float(TIME_UNIFORM), Some(0.0));

        let glow_users = scene
            .orbiting
            .iter()
            .filter(|body| match scene.graph.node(body.node).kind {
                NodeKind::Mesh { material, .. } => {
                    scene.graph.material(material).shader_state() == Some(scene.glow_state)
                }
                _ => false,
            })
            .count();
        assert_eq!(glow_users, 2);
    }

    #[test]
    fn particle_buffer_keeps_raw_count() {
        let scene = build();
        let NodeKind::Points { geometry, .. } = scene.graph.node(scene.particles).kind else {
            panic!("particles node is not a point cloud");
        };
        match scene.graph.geometry(geometry) {
            Geometry::Particles(field) => {
                assert_eq!(field.len(), 15_000);
                assert_eq!(field.point_count(), 5_000);
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn every_mesh_reference_resolves() {
        let scene = build();
        let graph = &scene.graph;
        for (id, _) in graph.world_matrices() {
            if let NodeKind::Mesh { geometry, material } | NodeKind::Points { geometry, material } =
                graph.node(id).kind
            {
                let _ = graph.geometry(geometry);
                let _ = graph.material(material);
            }
        }
        let materials: Vec<_> = graph.materials().collect();
        assert!(materials.iter().any(|(_, m)| matches!(m, Material::Points(_))));
    }

    #[test]
    fn lights_are_placed_from_config() {
        let scene = build();
        let lights = scene.graph.point_lights();
        assert_eq!(lights.len(), 2);
        assert_eq!(lights[0].0, Vec3::new(2.0, 3.0, 4.0));
        assert!((lights[0].1.intensity - 0.3).abs() < 1e-6);
        assert_eq!(lights[1].0, Vec3::ZERO);
        assert_eq!(lights[1].1.color, [1.0, 0.0, 0.0]);
    }
}
