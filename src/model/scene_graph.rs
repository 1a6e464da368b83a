use glam::{EulerRot, Mat4, Quat, Vec3};

use super::geometry::{Geometry, GeometryId};
use super::material::{Material, ShaderStateId};
use super::shader_state::ShaderState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

/// Local transform; rotation is XYZ Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation;
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            self.position,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Mesh { geometry: GeometryId, material: MaterialId },
    Points { geometry: GeometryId, material: MaterialId },
    PointLight(PointLight),
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Static-topology scene: nodes are only ever added, never removed.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    geometries: Vec<Geometry>,
    materials: Vec<Material>,
    shader_states: Vec<ShaderState>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn register_shader_state(&mut self, state: ShaderState) -> ShaderStateId {
        self.shader_states.push(state);
        ShaderStateId(self.shader_states.len() - 1)
    }

    pub fn add_root(&mut self, name: &str, kind: NodeKind, transform: Transform) -> NodeId {
        let id = self.push_node(name, kind, transform, None);
        self.roots.push(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, name: &str, kind: NodeKind, transform: Transform) -> NodeId {
        let id = self.push_node(name, kind, transform, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push_node(&mut self, name: &str, kind: NodeKind, transform: Transform, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(SceneNode {
            name: name.to_string(),
            transform,
            kind,
            parent,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    pub fn geometry(&self, id: GeometryId) -> &Geometry {
        &self.geometries[id.0]
    }

    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        self.geometries.iter().enumerate().map(|(i, g)| (GeometryId(i), g))
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter().enumerate().map(|(i, m)| (MaterialId(i), m))
    }

    pub fn shader_state(&self, id: ShaderStateId) -> &ShaderState {
        &self.shader_states[id.0]
    }

    pub fn shader_states(&self) -> &[ShaderState] {
        &self.shader_states
    }

    pub fn shader_states_mut(&mut self) -> impl Iterator<Item = &mut ShaderState> {
        self.shader_states.iter_mut()
    }

    /// Model matrix of `id` including all of its ancestors.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = self.nodes[id.0].transform.matrix();
        let mut parent = self.nodes[id.0].parent;
        while let Some(p) = parent {
            matrix = self.nodes[p.0].transform.matrix() * matrix;
            parent = self.nodes[p.0].parent;
        }
        matrix
    }

    /// Depth-first world matrices of every node, parents before children.
    pub fn world_matrices(&self) -> Vec<(NodeId, Mat4)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, Mat4::IDENTITY))
            .collect();

        while let Some((id, parent_matrix)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = parent_matrix * node.transform.matrix();
            out.push((id, world));
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
        out
    }

    /// World-space position and parameters of every point light.
    pub fn point_lights(&self) -> Vec<(Vec3, PointLight)> {
        self.world_matrices()
            .into_iter()
            .filter_map(|(id, world)| match self.nodes[id.0].kind {
                NodeKind::PointLight(light) => Some((world.w_axis.truncate(), light)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SphereSpec;
    use crate::model::material::{Material, PointsMaterial};

    fn graph_with_parent_and_child() -> (SceneGraph, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let geometry = graph.add_geometry(Geometry::Sphere(SphereSpec {
            radius: 1.0,
            width_segments: 8,
            height_segments: 8,
        }));
        let material = graph.add_material(Material::Points(PointsMaterial { color: [1.0; 3], size: 1.0 }));
        let kind = NodeKind::Mesh { geometry, material };
        let parent = graph.add_root("parent", kind, Transform::at(Vec3::new(1.0, 2.0, 3.0)));
        let child = graph.add_child(parent, "child", kind, Transform::at(Vec3::new(0.0, 1.0, 0.0)));
        (graph, parent, child)
    }

    #[test]
    fn children_follow_parent_translation() {
        let (mut graph, parent, child) = graph_with_parent_and_child();
        let before = graph.world_matrix(child).w_axis.truncate();
        assert!(before.abs_diff_eq(Vec3::new(1.0, 3.0, 3.0), 1e-6));

        graph.node_mut(parent).transform.position = Vec3::new(-2.0, 0.0, 0.0);
        let after = graph.world_matrix(child).w_axis.truncate();
        assert!(after.abs_diff_eq(Vec3::new(-2.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn children_follow_parent_rotation() {
        let (mut graph, parent, child) = graph_with_parent_and_child();
        graph.node_mut(parent).transform.position = Vec3::ZERO;
        graph.node_mut(child).transform.position = Vec3::new(1.0, 0.0, 0.0);
        graph.node_mut(parent).transform.rotation.y = std::f32::consts::FRAC_PI_2;
        let p = graph.world_matrix(child).w_axis.truncate();
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }

    #[test]
    fn world_matrices_visit_parents_first() {
        let (graph, parent, child) = graph_with_parent_and_child();
        let order: Vec<NodeId> = graph.world_matrices().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![parent, child]);
        assert_eq!(graph.node(child).parent(), Some(parent));
        assert_eq!(graph.node(parent).children(), &[child]);
        assert_eq!(graph.roots(), &[parent]);
    }

    #[test]
    fn world_matrices_agree_with_world_matrix() {
        let (graph, _, _) = graph_with_parent_and_child();
        for (id, m) in graph.world_matrices() {
            assert!(m.abs_diff_eq(graph.world_matrix(id), 1e-6));
        }
    }

    #[test]
    fn point_lights_report_world_position() {
        let mut graph = SceneGraph::new();
        let light = PointLight { color: [1.0, 0.0, 0.0], intensity: 2.0 };
        graph.add_root("light", NodeKind::PointLight(light), Transform::at(Vec3::new(2.0, 3.0, 4.0)));
        let lights = graph.point_lights();
        assert_eq!(lights, vec![(Vec3::new(2.0, 3.0, 4.0), light)]);
    }
}
