use egui::Context;

use crate::controller::SceneContext;
use crate::model::Geometry;
use crate::view::HudFrame;

/// Raw input for a frame whose only input is time and screen size.
pub fn screen_input(logical_width: f32, logical_height: f32, pixels_per_point: f32, now_seconds: f64) -> egui::RawInput {
    let mut raw_input = egui::RawInput::default();
    raw_input.time = Some(now_seconds);
    raw_input.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::new(0.0, 0.0),
        egui::vec2(logical_width, logical_height),
    ));
    if let Some(viewport) = raw_input.viewports.get_mut(&egui::ViewportId::ROOT) {
        viewport.native_pixels_per_point = Some(pixels_per_point);
    }
    raw_input
}

/// Run the HUD for one frame and return the egui output.
pub fn build_hud(egui_ctx: &Context, raw_input: egui::RawInput, ctx: &SceneContext) -> egui::FullOutput {
    let lines = hud_lines(ctx);
    egui_ctx.run(raw_input, |ui_ctx| {
        egui::Window::new("orbscene")
            .default_pos([8.0, 8.0])
            .resizable(false)
            .show(ui_ctx, |ui| {
                for line in &lines {
                    ui.label(egui::RichText::new(line).small());
                }
                ui.separator();
                ui.label(egui::RichText::new("Drag - Orbit").small());
                ui.label(egui::RichText::new("Wheel - Zoom").small());
                ui.label(egui::RichText::new("H - Hide").small());
            });
    })
}

/// Tessellate `full_output` for the dispatcher, handing back what the host
/// still has to apply (cursor, clipboard).
pub fn into_hud_frame(egui_ctx: &Context, full_output: egui::FullOutput) -> (HudFrame, egui::PlatformOutput) {
    let primitives = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
    (
        HudFrame {
            primitives,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        },
        full_output.platform_output,
    )
}

pub fn hud_lines(ctx: &SceneContext) -> Vec<String> {
    let eye = ctx.camera.eye;
    let points: usize = ctx
        .scene
        .graph
        .geometries()
        .map(|(_, g)| match g {
            Geometry::Particles(field) => field.point_count(),
            Geometry::Sphere(_) => 0,
        })
        .sum();

    vec![
        format!("FPS: {:.0}", ctx.stats.fps),
        format!("Time: {:.1}s", ctx.stats.last_elapsed().unwrap_or(0.0)),
        format!("Variant: {}", ctx.config.variant.name()),
        format!("Camera: x: {:.2} y: {:.2} z: {:.2}", eye.x, eye.y, eye.z),
        format!("Particles: {points}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SceneConfig, Variant};

    #[test]
    fn hud_reports_scene_state() {
        let mut config = SceneConfig::with_variant(Variant::Bloom);
        config.seed = Some(3);
        let mut ctx = SceneContext::new(config, 640, 480, 1.0);
        ctx.update_at(0.0);

        let lines = hud_lines(&ctx);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "Time: 0.0s");
        assert_eq!(lines[2], "Variant: bloom");
        assert!(lines[3].starts_with("Camera: x: 0.00"));
        assert!(lines[3].ends_with("z: 5.00"));
        assert_eq!(lines[4], "Particles: 5000");
    }

    #[test]
    fn screen_input_covers_the_viewport() {
        let input = screen_input(800.0, 600.0, 2.0, 1.5);
        assert_eq!(input.time, Some(1.5));
        assert_eq!(input.screen_rect.map(|r| r.size()), Some(egui::vec2(800.0, 600.0)));
    }
}
