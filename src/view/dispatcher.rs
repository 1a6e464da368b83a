use crate::config::SceneConfig;
use crate::controller::SceneContext;
use crate::error::SceneError;
use crate::view::bloom::{BloomPipeline, BloomSettings, HDR_FORMAT};
use crate::view::gpu_init::GpuContext;
use crate::view::render::SceneRenderer;
use crate::view::texture::{create_depth_texture, Texture};

/// How a frame reaches the surface; fixed at startup.
pub enum RenderRoute {
    Direct,
    Bloom(BloomPipeline),
}

impl RenderRoute {
    pub fn name(&self) -> &'static str {
        match self {
            RenderRoute::Direct => "direct",
            RenderRoute::Bloom(_) => "bloom",
        }
    }
}

/// Tessellated egui output to overlay on the frame.
pub struct HudFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// Nothing was drawn this tick; the next tick tries again.
    Skipped,
    /// The loop must stop.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceAction {
    Reconfigure,
    Skip,
    Stop,
}

fn classify_surface_error(err: &wgpu::SurfaceError) -> SurfaceAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceAction::Reconfigure,
        wgpu::SurfaceError::OutOfMemory => SurfaceAction::Stop,
        _ => SurfaceAction::Skip,
    }
}

/// Submits exactly one frame per call, directly or through bloom.
pub struct RenderDispatcher {
    pub gpu: GpuContext,
    scene_renderer: SceneRenderer,
    route: RenderRoute,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    egui_renderer: egui_wgpu::Renderer,
}

impl RenderDispatcher {
    /// Build GPU resources for the scene in `ctx`. `normal_map` holds the
    /// encoded image bytes loaded at startup.
    pub fn new(gpu: GpuContext, ctx: &SceneContext, normal_map: &[u8]) -> Result<Self, SceneError> {
        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();
        let (width, height) = (gpu.config.width, gpu.config.height);

        let route = select_route(&ctx.config, device, gpu.format, width, height);
        let scene_format = match route {
            RenderRoute::Direct => gpu.format,
            RenderRoute::Bloom(_) => HDR_FORMAT,
        };

        let normal_map = Texture::from_image_bytes(device, queue, normal_map, "normal_map")?;
        let scene_renderer = SceneRenderer::new(device, queue, scene_format, &ctx.scene.graph, normal_map);
        let (depth_texture, depth_view) = create_depth_texture(device, width, height);
        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());

        tracing::info!(route = route.name(), width, height, "render dispatcher ready");

        Ok(Self {
            gpu,
            scene_renderer,
            route,
            _depth_texture: depth_texture,
            depth_view,
            egui_renderer,
        })
    }

    pub fn route(&self) -> &RenderRoute {
        &self.route
    }

    /// Resize the surface and recreate depth and post-processing targets.
    /// `width`/`height` are physical pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.gpu.resize(width, height);

        let device = self.gpu.device.as_ref();
        let (depth_texture, depth_view) = create_depth_texture(device, width, height);
        self._depth_texture = depth_texture;
        self.depth_view = depth_view;

        if let RenderRoute::Bloom(bloom) = &mut self.route {
            bloom.resize(device, width, height);
        }
        tracing::debug!(width, height, "render targets resized");
    }

    /// Draw the current state of `ctx`, plus the HUD when given.
    pub fn dispatch(&mut self, ctx: &SceneContext, hud: Option<HudFrame>) -> FrameOutcome {
        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => return self.handle_surface_error(err),
        };

        let device = self.gpu.device.as_ref();
        let queue = self.gpu.queue.as_ref();
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        self.scene_renderer.update(queue, &ctx.scene, &ctx.camera);
        match &self.route {
            RenderRoute::Direct => self.scene_renderer.draw(&mut encoder, &view, &self.depth_view),
            RenderRoute::Bloom(bloom) => {
                bloom.update_uniforms(queue);
                self.scene_renderer.draw(&mut encoder, bloom.scene_view(), &self.depth_view);
                bloom.render(&mut encoder, &view);
            }
        }

        if let Some(hud) = hud {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
                pixels_per_point: hud.pixels_per_point,
            };

            for (id, image_delta) in &hud.textures_delta.set {
                self.egui_renderer.update_texture(device, queue, *id, image_delta);
            }
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, &hud.primitives, &screen_descriptor);

            {
                let egui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("hud_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                self.egui_renderer
                    .render(&mut egui_pass.forget_lifetime(), &hud.primitives, &screen_descriptor);
            }

            for id in &hud.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        FrameOutcome::Presented
    }

    fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> FrameOutcome {
        match classify_surface_error(&err) {
            SurfaceAction::Reconfigure => {
                tracing::warn!(error = %err, "surface lost, reconfiguring");
                self.gpu.reconfigure();
                FrameOutcome::Skipped
            }
            SurfaceAction::Skip => {
                tracing::debug!(error = %err, "frame skipped");
                FrameOutcome::Skipped
            }
            SurfaceAction::Stop => {
                tracing::error!(error = %err, "surface out of memory, stopping");
                FrameOutcome::Fatal
            }
        }
    }
}

fn select_route(
    config: &SceneConfig,
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> RenderRoute {
    if config.variant.uses_post_processing() {
        let settings = BloomSettings::from(config.bloom);
        RenderRoute::Bloom(BloomPipeline::new(device, surface_format, width, height, settings))
    } else {
        RenderRoute::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_and_outdated_surfaces_are_reconfigured() {
        assert_eq!(classify_surface_error(&wgpu::SurfaceError::Lost), SurfaceAction::Reconfigure);
        assert_eq!(classify_surface_error(&wgpu::SurfaceError::Outdated), SurfaceAction::Reconfigure);
    }

    #[test]
    fn timeout_skips_the_frame() {
        assert_eq!(classify_surface_error(&wgpu::SurfaceError::Timeout), SurfaceAction::Skip);
    }

    #[test]
    fn out_of_memory_stops_the_loop() {
        assert_eq!(classify_surface_error(&wgpu::SurfaceError::OutOfMemory), SurfaceAction::Stop);
    }
}
