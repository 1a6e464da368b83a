use wgpu::util::DeviceExt;

use crate::model::{Camera, Geometry, Material, MaterialId, NodeId, NodeKind, Scene, SceneGraph, ShaderStateId};
use crate::view::mesh::{Mesh, MeshBuffer, PointBuffer, Vertex, POINT_LAYOUT};
use crate::view::texture::{Texture, DEPTH_FORMAT};
use crate::view::uniforms::{FrameUniform, GlowUniform, ModelUniform, PointsUniform, StandardUniform};

/// Transparent black; the page shows through wherever nothing is drawn.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::TRANSPARENT;

enum GpuGeometry {
    Mesh(MeshBuffer),
    Points(PointBuffer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Standard,
    Glow,
    Points,
}

struct MaterialBinding {
    pass: Pass,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Shader state mirrored into `buffer` every frame, with the material opacity.
    glow: Option<(ShaderStateId, f32)>,
}

struct NodeDraw {
    node: NodeId,
    geometry: usize,
    material: MaterialId,
    transparent: bool,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
}

/// Draws a [`SceneGraph`] into one colour target plus depth.
///
/// GPU resources mirror the graph built at startup: one buffer per geometry,
/// one bind group per material and one model uniform per drawable node.
pub struct SceneRenderer {
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    standard_pipeline: wgpu::RenderPipeline,
    glow_pipeline: wgpu::RenderPipeline,
    points_pipeline: wgpu::RenderPipeline,
    geometries: Vec<GpuGeometry>,
    materials: Vec<MaterialBinding>,
    draws: Vec<NodeDraw>,
    order: Vec<usize>,
    // Bound through material bind groups; kept alive here.
    _normal_map: Texture,
    _flat_normal: Texture,
}

struct Layouts {
    frame: wgpu::BindGroupLayout,
    model: wgpu::BindGroupLayout,
    standard: wgpu::BindGroupLayout,
    glow: wgpu::BindGroupLayout,
    points: wgpu::BindGroupLayout,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[uniform_entry(0, visibility)],
    })
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let frame = uniform_layout(device, "frame_bgl", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let model = uniform_layout(device, "model_bgl", wgpu::ShaderStages::VERTEX);
        let glow = uniform_layout(device, "glow_bgl", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let points = uniform_layout(device, "points_bgl", wgpu::ShaderStages::FRAGMENT);
        let standard = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("standard_bgl"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        Self { frame, model, standard, glow, points }
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    source: &'a str,
    material_layout: &'a wgpu::BindGroupLayout,
    buffer: wgpu::VertexBufferLayout<'static>,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
}

/// Straight-alpha colour over a pre-multiplied destination.
const GLOW_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

fn create_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    layouts: &Layouts,
    desc: PipelineDesc,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: &[&layouts.frame, &layouts.model, desc.material_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[desc.buffer],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState { format, blend: desc.blend, write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

fn uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn single_buffer_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
    })
}

impl SceneRenderer {
    /// Upload everything the graph references. `format` is the colour target
    /// the scene is drawn into (the surface, or the HDR target when bloom runs).
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        graph: &SceneGraph,
        normal_map: Texture,
    ) -> Self {
        let layouts = Layouts::new(device);
        let flat_normal = Texture::flat_normal(device, queue);

        let standard_pipeline = create_pipeline(device, format, &layouts, PipelineDesc {
            label: "standard_pipeline",
            source: include_str!("shaders/standard.wgsl"),
            material_layout: &layouts.standard,
            buffer: Vertex::LAYOUT,
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            blend: None,
            depth_write: true,
        });
        let glow_pipeline = create_pipeline(device, format, &layouts, PipelineDesc {
            label: "glow_pipeline",
            source: include_str!("shaders/glow.wgsl"),
            material_layout: &layouts.glow,
            buffer: Vertex::LAYOUT,
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            blend: Some(GLOW_BLEND),
            depth_write: false,
        });
        let points_pipeline = create_pipeline(device, format, &layouts, PipelineDesc {
            label: "points_pipeline",
            source: include_str!("shaders/points.wgsl"),
            material_layout: &layouts.points,
            buffer: POINT_LAYOUT,
            topology: wgpu::PrimitiveTopology::PointList,
            cull_mode: None,
            blend: None,
            depth_write: true,
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_buffer"),
            size: std::mem::size_of::<FrameUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = single_buffer_bind_group(device, "frame_bg", &layouts.frame, &frame_buffer);

        let geometries = graph
            .geometries()
            .map(|(_, geometry)| match geometry {
                Geometry::Sphere(spec) => GpuGeometry::Mesh(Mesh::sphere(spec).upload(device)),
                Geometry::Particles(field) => GpuGeometry::Points(PointBuffer::upload(field, device)),
            })
            .collect();

        let materials = graph
            .materials()
            .map(|(id, material)| {
                let label = format!("material_{}", id.0);
                match material {
                    Material::Standard(m) => {
                        let buffer = uniform_buffer(device, &label, &StandardUniform::from(m));
                        let texture = if m.normal_mapped { &normal_map } else { &flat_normal };
                        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                            label: Some(&label),
                            layout: &layouts.standard,
                            entries: &[
                                wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() },
                                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&texture.view) },
                                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&texture.sampler) },
                            ],
                        });
                        MaterialBinding { pass: Pass::Standard, buffer, bind_group, glow: None }
                    }
                    Material::Shader(m) => {
                        let uniform = GlowUniform::from_state(graph.shader_state(m.state), m.opacity);
                        let buffer = uniform_buffer(device, &label, &uniform);
                        let bind_group = single_buffer_bind_group(device, &label, &layouts.glow, &buffer);
                        MaterialBinding { pass: Pass::Glow, buffer, bind_group, glow: Some((m.state, m.opacity)) }
                    }
                    Material::Points(m) => {
                        let buffer = uniform_buffer(device, &label, &PointsUniform::from(m));
                        let bind_group = single_buffer_bind_group(device, &label, &layouts.points, &buffer);
                        MaterialBinding { pass: Pass::Points, buffer, bind_group, glow: None }
                    }
                }
            })
            .collect();

        let draws: Vec<NodeDraw> = graph
            .world_matrices()
            .into_iter()
            .filter_map(|(node, world)| {
                let (geometry, material) = match graph.node(node).kind {
                    NodeKind::Mesh { geometry, material } | NodeKind::Points { geometry, material } => {
                        (geometry, material)
                    }
                    NodeKind::PointLight(_) => return None,
                };
                let label = format!("model_{}", graph.node(node).name);
                let model_buffer = uniform_buffer(device, &label, &ModelUniform::from(world));
                let model_bind_group = single_buffer_bind_group(device, &label, &layouts.model, &model_buffer);
                Some(NodeDraw {
                    node,
                    geometry: geometry.0,
                    material,
                    transparent: graph.material(material).is_transparent(),
                    model_buffer,
                    model_bind_group,
                })
            })
            .collect();

        tracing::info!(
            geometries = graph.geometries().count(),
            materials = graph.materials().count(),
            draws = draws.len(),
            ?format,
            "scene renderer ready"
        );

        let order = (0..draws.len()).collect();
        Self {
            frame_buffer,
            frame_bind_group,
            standard_pipeline,
            glow_pipeline,
            points_pipeline,
            geometries,
            materials,
            draws,
            order,
            _normal_map: normal_map,
            _flat_normal: flat_normal,
        }
    }

    /// Mirror the current scene state into uniform buffers and sort draws.
    pub fn update(&mut self, queue: &wgpu::Queue, scene: &Scene, camera: &Camera) {
        let graph = &scene.graph;

        let frame = FrameUniform::new(camera, &graph.point_lights());
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let worlds = graph.world_matrices();
        let mut depths = Vec::with_capacity(self.draws.len());
        for draw in &self.draws {
            let world = worlds
                .iter()
                .find(|(id, _)| *id == draw.node)
                .map(|(_, m)| *m)
                .unwrap_or_default();
            queue.write_buffer(&draw.model_buffer, 0, bytemuck::bytes_of(&ModelUniform::from(world)));
            depths.push((draw.transparent, camera.eye.distance(world.w_axis.truncate())));
        }

        for binding in &self.materials {
            if let Some((state, opacity)) = binding.glow {
                let uniform = GlowUniform::from_state(graph.shader_state(state), opacity);
                queue.write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniform));
            }
        }

        self.order = draw_order(&depths);
        tracing::trace!(draws = self.order.len(), "scene uniforms updated");
    }

    /// Record one pass that clears `color_view` and draws every node.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, color_view: &wgpu::TextureView, depth_view: &wgpu::TextureView) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Clear(CLEAR_COLOR), store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Store }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_bind_group(0, &self.frame_bind_group, &[]);
        for &i in &self.order {
            let draw = &self.draws[i];
            let material = &self.materials[draw.material.0];
            let pipeline = match material.pass {
                Pass::Standard => &self.standard_pipeline,
                Pass::Glow => &self.glow_pipeline,
                Pass::Points => &self.points_pipeline,
            };
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(1, &draw.model_bind_group, &[]);
            rpass.set_bind_group(2, &material.bind_group, &[]);

            match &self.geometries[draw.geometry] {
                GpuGeometry::Mesh(mesh) => {
                    rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
                GpuGeometry::Points(points) => {
                    rpass.set_vertex_buffer(0, points.vertex_buffer.slice(..));
                    rpass.draw(0..points.vertex_count, 0..1);
                }
            }
        }
    }
}

/// Opaque draws first in graph order, then transparent ones far to near.
fn draw_order(entries: &[(bool, f32)]) -> Vec<usize> {
    let mut opaque: Vec<usize> = (0..entries.len()).filter(|&i| !entries[i].0).collect();
    let mut transparent: Vec<usize> = (0..entries.len()).filter(|&i| entries[i].0).collect();
    transparent.sort_by(|&a, &b| entries[b].1.total_cmp(&entries[a].1));
    opaque.append(&mut transparent);
    opaque
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_draws_keep_graph_order() {
        let order = draw_order(&[(false, 9.0), (false, 1.0), (false, 5.0)]);
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn transparent_draws_go_last_back_to_front() {
        let order = draw_order(&[(true, 4.0), (false, 1.0), (true, 6.0), (false, 2.0)]);
        assert_eq!(order, vec![1, 3, 2, 0]);
    }

    #[test]
    fn empty_scene_draws_nothing() {
        assert!(draw_order(&[]).is_empty());
    }
}
