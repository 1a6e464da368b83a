//! Bloom post-processing for the `bloom` variant.
//!
//! The scene is drawn into an HDR target. A bright pass keeps what exceeds
//! the luminance threshold at half resolution, a horizontal then vertical
//! Gaussian blur spreads it, and the composite adds it back over the scene
//! into the surface.

use crate::config::BloomSpec;

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Per-pass uniforms for the bloom shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BloomUniforms {
    /// Blur step in uv units: texel size scaled by the bloom radius.
    pub texel_step: [f32; 2],
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    pub _padding: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl From<BloomSpec> for BloomSettings {
    fn from(spec: BloomSpec) -> Self {
        Self {
            strength: spec.strength.max(0.0),
            radius: spec.radius.clamp(0.0, 1.0),
            threshold: spec.threshold.max(0.0),
        }
    }
}

impl BloomSettings {
    pub fn uniforms(&self, blur_width: u32, blur_height: u32) -> BloomUniforms {
        let spread = 1.0 + 4.0 * self.radius;
        BloomUniforms {
            texel_step: [spread / blur_width.max(1) as f32, spread / blur_height.max(1) as f32],
            threshold: self.threshold,
            strength: self.strength,
            radius: self.radius,
            _padding: [0.0; 3],
        }
    }
}

/// Bright pass and blur run at half the scene resolution.
pub fn blur_extent(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

struct Targets {
    scene_view: wgpu::TextureView,
    bright_view: wgpu::TextureView,
    blur_h_view: wgpu::TextureView,
    blur_v_view: wgpu::TextureView,
    bright_bind_group: wgpu::BindGroup,
    blur_h_bind_group: wgpu::BindGroup,
    blur_v_bind_group: wgpu::BindGroup,
    composite_bind_group: wgpu::BindGroup,
    blur_size: (u32, u32),
}

pub struct BloomPipeline {
    pub settings: BloomSettings,
    bright_pipeline: wgpu::RenderPipeline,
    blur_h_pipeline: wgpu::RenderPipeline,
    blur_v_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    blur_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    targets: Targets,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn uniform_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: std::num::NonZeroU64::new(std::mem::size_of::<BloomUniforms>() as u64),
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    entry_point: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(entry_point),
            targets: &[Some(wgpu::ColorTargetState { format, blend: None, write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_target(device: &wgpu::Device, width: u32, height: u32, label: &str) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

impl BloomPipeline {
    /// `surface_format` is where the composite lands; the scene itself is
    /// rendered into [`BloomPipeline::scene_view`].
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        settings: BloomSettings,
    ) -> Self {
        let bloom_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/bloom.wgsl").into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bloom uniforms"),
            size: std::mem::size_of::<BloomUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let blur_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom bind group layout"),
            entries: &[uniform_entry(), texture_entry(1), sampler_entry(2)],
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite bind group layout"),
            entries: &[uniform_entry(), texture_entry(1), texture_entry(2), sampler_entry(3)],
        });

        let blur_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom pipeline layout"),
            bind_group_layouts: &[&blur_layout],
            push_constant_ranges: &[],
        });
        let composite_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("composite pipeline layout"),
            bind_group_layouts: &[&composite_layout],
            push_constant_ranges: &[],
        });

        let bright_pipeline =
            fullscreen_pipeline(device, "bloom bright pipeline", &bloom_shader, &blur_pipeline_layout, "fs_bright", HDR_FORMAT);
        let blur_h_pipeline =
            fullscreen_pipeline(device, "bloom h pipeline", &bloom_shader, &blur_pipeline_layout, "fs_blur_h", HDR_FORMAT);
        let blur_v_pipeline =
            fullscreen_pipeline(device, "bloom v pipeline", &bloom_shader, &blur_pipeline_layout, "fs_blur_v", HDR_FORMAT);
        let composite_pipeline = fullscreen_pipeline(
            device,
            "composite pipeline",
            &composite_shader,
            &composite_pipeline_layout,
            "fs_main",
            surface_format,
        );

        let targets = Self::create_targets(device, &blur_layout, &composite_layout, &uniform_buffer, &sampler, width, height);

        tracing::info!(
            strength = settings.strength,
            radius = settings.radius,
            threshold = settings.threshold,
            "bloom pipeline ready"
        );

        Self {
            settings,
            bright_pipeline,
            blur_h_pipeline,
            blur_v_pipeline,
            composite_pipeline,
            uniform_buffer,
            blur_layout,
            composite_layout,
            sampler,
            targets,
        }
    }

    /// HDR target the scene renderer draws into.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.targets.scene_view
    }

    /// Recreate every intermediate target for a new physical size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.targets = Self::create_targets(
            device,
            &self.blur_layout,
            &self.composite_layout,
            &self.uniform_buffer,
            &self.sampler,
            width,
            height,
        );
    }

    pub fn update_uniforms(&self, queue: &wgpu::Queue) {
        let (w, h) = self.targets.blur_size;
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.settings.uniforms(w, h)));
    }

    /// Bright pass, both blur passes and the composite into `output`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let t = &self.targets;
        fullscreen_pass(encoder, "bloom bright pass", &t.bright_view, &self.bright_pipeline, &t.bright_bind_group);
        fullscreen_pass(encoder, "bloom h pass", &t.blur_h_view, &self.blur_h_pipeline, &t.blur_h_bind_group);
        fullscreen_pass(encoder, "bloom v pass", &t.blur_v_view, &self.blur_v_pipeline, &t.blur_v_bind_group);
        fullscreen_pass(encoder, "composite pass", output, &self.composite_pipeline, &t.composite_bind_group);
    }

    fn create_targets(
        device: &wgpu::Device,
        blur_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
    ) -> Targets {
        let blur_size = blur_extent(width, height);
        let scene_view = create_target(device, width, height, "bloom_scene");
        let bright_view = create_target(device, blur_size.0, blur_size.1, "bloom_bright");
        let blur_h_view = create_target(device, blur_size.0, blur_size.1, "bloom_h");
        let blur_v_view = create_target(device, blur_size.0, blur_size.1, "bloom_v");

        let blur_group = |source: &wgpu::TextureView, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: blur_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: uniform_buffer.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(source) },
                    wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(sampler) },
                ],
            })
        };
        let bright_bind_group = blur_group(&scene_view, "bloom bind group bright");
        let blur_h_bind_group = blur_group(&bright_view, "bloom bind group h");
        let blur_v_bind_group = blur_group(&blur_h_view, "bloom bind group v");

        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite bind group"),
            layout: composite_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: uniform_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&scene_view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&blur_v_view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        tracing::debug!(width, height, blur_width = blur_size.0, blur_height = blur_size.1, "bloom targets created");

        Targets {
            scene_view,
            bright_view,
            blur_h_view,
            blur_v_view,
            bright_bind_group,
            blur_h_bind_group,
            blur_v_bind_group,
            composite_bind_group,
            blur_size,
        }
    }
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    #[test]
    fn bloom_uniforms_size_is_32_bytes() {
        assert_eq!(std::mem::size_of::<BloomUniforms>(), 32);
    }

    #[test]
    fn settings_follow_config() {
        let s = BloomSettings::from(SceneConfig::default().bloom);
        assert!((s.strength - 1.5).abs() < f32::EPSILON);
        assert!((s.radius - 0.4).abs() < f32::EPSILON);
        assert!((s.threshold - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn settings_clamp_out_of_range_values() {
        let s = BloomSettings::from(BloomSpec { strength: -1.0, radius: 3.0, threshold: -0.5 });
        assert_eq!(s.strength, 0.0);
        assert_eq!(s.radius, 1.0);
        assert_eq!(s.threshold, 0.0);
    }

    #[test]
    fn blur_step_widens_with_radius() {
        let narrow = BloomSettings { strength: 1.0, radius: 0.0, threshold: 0.5 }.uniforms(400, 200);
        let wide = BloomSettings { strength: 1.0, radius: 1.0, threshold: 0.5 }.uniforms(400, 200);
        assert!((narrow.texel_step[0] - 1.0 / 400.0).abs() < 1e-9);
        assert!((wide.texel_step[1] - 5.0 / 200.0).abs() < 1e-9);
        assert!(wide.texel_step[0] > narrow.texel_step[0]);
    }

    #[test]
    fn blur_runs_at_half_resolution() {
        assert_eq!(blur_extent(1920, 1080), (960, 540));
        assert_eq!(blur_extent(1, 1), (1, 1));
    }
}
