pub mod config;
pub mod error;
pub mod logging;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

pub use config::{SceneConfig, Variant};
pub use controller::SceneContext;
pub use error::SceneError;

#[cfg(target_arch = "wasm32")]
pub use web::{launch, SceneHandle};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::any::Any;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use wasm_bindgen::closure::{Closure, WasmClosure};
    use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
    use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

    use crate::config::SceneConfig;
    use crate::controller::input::wasm as web_input;
    use crate::controller::{InputEvent, SceneContext};
    use crate::error::SceneError;
    use crate::model::clock;
    use crate::view::{assets, FrameOutcome, GpuContext, RenderDispatcher};
    use crate::{logging, ui};

    const CANVAS_SELECTOR: &str = "canvas.webgl";

    #[wasm_bindgen(start)]
    pub fn start() {
        logging::init();
    }

    /// Build the scene on the page's `canvas.webgl` and start rendering.
    /// Rejects when the canvas, GPU or normal map is unavailable.
    #[wasm_bindgen]
    pub async fn launch() -> Result<SceneHandle, JsValue> {
        match launch_inner().await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                tracing::error!(error = %e, "scene startup failed");
                Err(e.into())
            }
        }
    }

    async fn launch_inner() -> Result<SceneHandle, SceneError> {
        let (window, document, canvas) = find_canvas()?;

        let mut config = SceneConfig::default();
        if let Ok(search) = window.location().search() {
            config.apply_query(&search);
        }
        let bloom = config.variant.uses_post_processing();

        let (width, height, dpr) = window_size(&window);
        let ctx = SceneContext::new(config, width, height, dpr);
        let (pw, ph) = ctx.viewport.physical_size();
        size_canvas(&canvas, &ctx);

        let gpu = GpuContext::new(&canvas, pw, ph).await?;
        let normal_map = assets::load_bytes(ctx.config.normal_map_path).await?;
        let dispatcher = RenderDispatcher::new(gpu, &ctx, &normal_map)?;

        let app = Rc::new(RefCell::new(WebApp {
            ctx,
            dispatcher,
            egui_ctx: egui::Context::default(),
            canvas: canvas.clone(),
        }));

        let mut listeners = Listeners::default();
        setup_listeners(&mut listeners, &window, &document, &canvas, &app, bloom).map_err(js_to_scene_error)?;

        let scheduler = FrameScheduler::start(window, move || app.borrow_mut().frame())
            .map_err(js_to_scene_error)?;

        tracing::info!("scene running");
        Ok(SceneHandle { scheduler, listeners })
    }

    /// Returned by [`launch`]; dropping it does not stop the scene, `stop()` does.
    #[wasm_bindgen]
    pub struct SceneHandle {
        scheduler: FrameScheduler,
        listeners: Listeners,
    }

    #[wasm_bindgen]
    impl SceneHandle {
        /// Cancel the frame loop and detach every event listener.
        pub fn stop(&mut self) {
            self.scheduler.stop();
            self.listeners.clear();
            tracing::info!("scene stopped");
        }

        #[wasm_bindgen(js_name = isRunning)]
        pub fn is_running(&self) -> bool {
            self.scheduler.is_running()
        }
    }

    struct WebApp {
        ctx: SceneContext,
        dispatcher: RenderDispatcher,
        egui_ctx: egui::Context,
        canvas: HtmlCanvasElement,
    }

    impl WebApp {
        /// Update then dispatch; `false` ends the loop.
        fn frame(&mut self) -> bool {
            self.ctx.update();

            let hud = self.ctx.input.hud_visible.then(|| {
                let viewport = &self.ctx.viewport;
                let raw_input = ui::screen_input(
                    viewport.width as f32,
                    viewport.height as f32,
                    viewport.pixel_ratio,
                    clock::now_seconds(),
                );
                let full_output = ui::build_hud(&self.egui_ctx, raw_input, &self.ctx);
                ui::into_hud_frame(&self.egui_ctx, full_output).0
            });

            self.dispatcher.dispatch(&self.ctx, hud) != FrameOutcome::Fatal
        }

        fn resize(&mut self, window: &Window) {
            let (width, height, dpr) = window_size(window);
            if let Some((pw, ph)) = self.ctx.resize(width, height, dpr) {
                size_canvas(&self.canvas, &self.ctx);
                self.dispatcher.resize(pw, ph);
            }
        }

        fn input(&mut self, event: InputEvent) {
            self.ctx.handle_input(&event);
        }
    }

    /// `requestAnimationFrame` loop owning its callback. The tick runs to
    /// completion before the next frame is requested.
    struct FrameScheduler {
        window: Window,
        running: Rc<Cell<bool>>,
        request_id: Rc<Cell<Option<i32>>>,
        callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    }

    impl FrameScheduler {
        fn start(window: Window, mut tick: impl FnMut() -> bool + 'static) -> Result<Self, JsValue> {
            let running = Rc::new(Cell::new(true));
            let request_id = Rc::new(Cell::new(None));
            let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

            {
                let running = running.clone();
                let request_id = request_id.clone();
                let callback_ref = callback.clone();
                let window = window.clone();
                *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                    request_id.set(None);
                    if !running.get() {
                        return;
                    }
                    if !tick() {
                        tracing::error!("frame loop stopped");
                        running.set(false);
                        return;
                    }
                    // Drop the closure once a stop arrives during the tick.
                    if !running.get() {
                        return;
                    }
                    if let Some(cb) = callback_ref.borrow().as_ref() {
                        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                            Ok(id) => request_id.set(Some(id)),
                            Err(e) => {
                                tracing::error!(error = ?e, "requestAnimationFrame failed");
                                running.set(false);
                            }
                        }
                    }
                }) as Box<dyn FnMut()>));
            }

            let first = match callback.borrow().as_ref() {
                Some(cb) => window.request_animation_frame(cb.as_ref().unchecked_ref())?,
                None => return Err(JsValue::from_str("frame callback missing")),
            };
            request_id.set(Some(first));

            Ok(Self { window, running, request_id, callback })
        }

        fn is_running(&self) -> bool {
            self.running.get()
        }

        fn stop(&mut self) {
            self.running.set(false);
            if let Some(id) = self.request_id.take() {
                let _ = self.window.cancel_animation_frame(id);
            }
            // Breaks the closure's reference to itself.
            self.callback.borrow_mut().take();
        }
    }

    struct Listener {
        target: EventTarget,
        event: &'static str,
        function: js_sys::Function,
        _closure: Box<dyn Any>,
    }

    /// Registered DOM listeners, detached on [`Listeners::clear`].
    #[derive(Default)]
    struct Listeners(Vec<Listener>);

    impl Listeners {
        fn add<T>(&mut self, target: &EventTarget, event: &'static str, closure: Closure<T>) -> Result<(), JsValue>
        where
            T: ?Sized + WasmClosure + 'static,
        {
            let function: js_sys::Function = closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
            target.add_event_listener_with_callback(event, &function)?;
            self.0.push(Listener {
                target: target.clone(),
                event,
                function,
                _closure: Box::new(closure),
            });
            Ok(())
        }

        fn clear(&mut self) {
            for listener in self.0.drain(..) {
                let _ = listener
                    .target
                    .remove_event_listener_with_callback(listener.event, &listener.function);
            }
        }
    }

    fn setup_listeners(
        listeners: &mut Listeners,
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
        app: &Rc<RefCell<WebApp>>,
        bloom: bool,
    ) -> Result<(), JsValue> {
        // Window resize
        {
            let app = app.clone();
            let window_for_size = window.clone();
            let resize = Closure::wrap(Box::new(move |_e: Event| {
                app.borrow_mut().resize(&window_for_size);
            }) as Box<dyn FnMut(Event)>);
            listeners.add(window, "resize", resize)?;
        }

        // Drag to orbit: starts on the canvas, tracked on the window
        {
            let app = app.clone();
            let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
                app.borrow_mut().input(web_input::mouse_down_to_input(&e));
            }) as Box<dyn FnMut(MouseEvent)>);
            listeners.add(canvas, "mousedown", mousedown)?;
        }
        {
            let app = app.clone();
            let mousemove = Closure::wrap(Box::new(move |e: MouseEvent| {
                app.borrow_mut().input(web_input::mouse_move_to_input(&e));
            }) as Box<dyn FnMut(MouseEvent)>);
            listeners.add(window, "mousemove", mousemove)?;
        }
        {
            let app = app.clone();
            let mouseup = Closure::wrap(Box::new(move |e: MouseEvent| {
                app.borrow_mut().input(web_input::mouse_up_to_input(&e));
            }) as Box<dyn FnMut(MouseEvent)>);
            listeners.add(window, "mouseup", mouseup)?;
        }

        // Wheel to dolly
        {
            let app = app.clone();
            let wheel = Closure::wrap(Box::new(move |e: WheelEvent| {
                e.prevent_default();
                app.borrow_mut().input(web_input::wheel_to_input(&e));
            }) as Box<dyn FnMut(WheelEvent)>);
            listeners.add(canvas, "wheel", wheel)?;
        }

        // Keyboard: H toggles the HUD
        {
            let app = app.clone();
            let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                app.borrow_mut().input(InputEvent::KeyDown(e.key()));
            }) as Box<dyn FnMut(KeyboardEvent)>);
            listeners.add(document, "keydown", keydown)?;
        }

        // Focus loss ends any drag
        {
            let app = app.clone();
            let blur = Closure::wrap(Box::new(move |_e: Event| {
                app.borrow_mut().input(InputEvent::FocusLost);
            }) as Box<dyn FnMut(Event)>);
            listeners.add(window, "blur", blur)?;
        }

        // Bloom variant: pointer hook registered but intentionally unhandled
        if bloom {
            let pointer_hook = Closure::wrap(Box::new(move |_e: MouseEvent| {}) as Box<dyn FnMut(MouseEvent)>);
            listeners.add(document, "mousemove", pointer_hook)?;
        }

        Ok(())
    }

    fn find_canvas() -> Result<(Window, Document, HtmlCanvasElement), SceneError> {
        let window = web_sys::window().ok_or_else(|| SceneError::Dom("no global `window`".into()))?;
        let document = window
            .document()
            .ok_or_else(|| SceneError::Dom("no document on window".into()))?;
        let canvas = document
            .query_selector(CANVAS_SELECTOR)
            .map_err(js_to_scene_error)?
            .ok_or_else(|| SceneError::Dom(format!("no `{CANVAS_SELECTOR}` element on the page")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SceneError::Dom(format!("`{CANVAS_SELECTOR}` is not a canvas")))?;
        Ok((window, document, canvas))
    }

    /// Logical window size and device pixel ratio.
    fn window_size(window: &Window) -> (u32, u32, f32) {
        let read = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0).max(1.0) as u32;
        (
            read(window.inner_width()),
            read(window.inner_height()),
            window.device_pixel_ratio() as f32,
        )
    }

    /// Drawing buffer in physical pixels, CSS box in logical pixels.
    fn size_canvas(canvas: &HtmlCanvasElement, ctx: &SceneContext) {
        let (pw, ph) = ctx.viewport.physical_size();
        canvas.set_width(pw);
        canvas.set_height(ph);
        let style = canvas.style();
        let _ = style.set_property("width", &format!("{}px", ctx.viewport.width));
        let _ = style.set_property("height", &format!("{}px", ctx.viewport.height));
    }

    fn js_to_scene_error(e: JsValue) -> SceneError {
        SceneError::Dom(e.as_string().unwrap_or_else(|| format!("{e:?}")))
    }
}
