use std::sync::Arc;

use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    keyboard::Key,
    window::Window,
};

use orbscene::{
    controller::{InputEvent, MouseButton, SceneContext},
    error::SceneError,
    logging,
    ui,
    view::{assets, FrameOutcome, GpuContext, RenderDispatcher},
    SceneConfig,
};

struct App {
    window: Arc<Window>,
    ctx: SceneContext,
    dispatcher: RenderDispatcher,
    /// Last cursor position in logical pixels.
    cursor: Option<(f32, f32)>,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
}

impl App {
    async fn new(window: Arc<Window>, config: SceneConfig) -> Result<Self, SceneError> {
        let scale = window.scale_factor();
        let logical: winit::dpi::LogicalSize<u32> = window.inner_size().to_logical(scale);
        let ctx = SceneContext::new(config, logical.width, logical.height, scale as f32);

        let gpu = GpuContext::new_native(window.clone()).await?;
        let normal_map = assets::load_bytes(ctx.config.normal_map_path).await?;
        let dispatcher = RenderDispatcher::new(gpu, &ctx, &normal_map)?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self { window, ctx, dispatcher, cursor: None, egui_state, egui_ctx })
    }

    /// Feed a window event to the HUD and the scene. Returns true if consumed.
    fn input(&mut self, event: &WindowEvent) -> bool {
        if self.ctx.input.hud_visible && self.egui_state.on_window_event(self.window.as_ref(), event).consumed {
            return true;
        }

        let scale = self.window.scale_factor();
        let input = match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state: ElementState::Pressed, logical_key: Key::Character(key), repeat: false, .. }, .. } => {
                Some(InputEvent::KeyDown(key.to_string()))
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Right => MouseButton::Right,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    _ => MouseButton::Left,
                };
                match state {
                    ElementState::Pressed => {
                        let (x, y) = self.cursor.unwrap_or((0.0, 0.0));
                        Some(InputEvent::PointerDown { button, x, y })
                    }
                    ElementState::Released => Some(InputEvent::PointerUp { button }),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(scale);
                self.cursor = Some((logical.x, logical.y));
                Some(InputEvent::PointerMove { x: logical.x, y: logical.y })
            }
            // winit reports wheel-up as positive; the controls follow the DOM sign
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -*y,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                Some(InputEvent::Wheel { delta_y })
            }
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            _ => None,
        };

        match input {
            Some(input) => {
                self.ctx.handle_input(&input);
                true
            }
            None => false,
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        let scale = self.window.scale_factor();
        let logical: winit::dpi::LogicalSize<u32> = new_size.to_logical(scale);
        // The surface always matches the window; the viewport drives aspect.
        if self.ctx.resize(logical.width, logical.height, scale as f32).is_some() {
            self.dispatcher.resize(new_size.width, new_size.height);
        }
    }

    fn render(&mut self) -> FrameOutcome {
        self.ctx.update();

        let hud = if self.ctx.input.hud_visible {
            let raw_input = self.egui_state.take_egui_input(&self.window);
            let full_output = ui::build_hud(&self.egui_ctx, raw_input, &self.ctx);
            let (hud, platform_output) = ui::into_hud_frame(&self.egui_ctx, full_output);
            self.egui_state.handle_platform_output(&self.window, platform_output);
            Some(hud)
        } else {
            None
        };

        self.dispatcher.dispatch(&self.ctx, hud)
    }
}

fn run() -> Result<(), SceneError> {
    let mut config = SceneConfig::default();
    config.apply_env();

    let event_loop = EventLoop::new().map_err(|e| SceneError::Window(e.to_string()))?;
    let window_attributes = Window::default_attributes()
        .with_title(format!("orbscene ({})", config.variant.name()))
        .with_transparent(true)
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = event_loop
        .create_window(window_attributes)
        .map_err(|e| SceneError::Window(e.to_string()))?;
    let window = Arc::new(window);

    let mut app = pollster::block_on(App::new(window.clone(), config))?;

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => {
                            app.resize(*physical_size);
                        }
                        WindowEvent::ScaleFactorChanged { .. } => {
                            let size = app.window.inner_size();
                            app.resize(size);
                        }
                        WindowEvent::RedrawRequested => {
                            if app.render() == FrameOutcome::Fatal {
                                elwt.exit();
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    }).map_err(|e| SceneError::Window(e.to_string()))
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        tracing::error!(error = %e, "orbscene failed");
        std::process::exit(1);
    }
}
