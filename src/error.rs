/// Errors that can abort scene startup. There is no recovery path: whoever
/// receives one logs it and stops.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("dom error: {0}")]
    Dom(String),

    #[error("window error: {0}")]
    Window(String),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found: {0}")]
    AdapterNotFound(#[from] wgpu::RequestAdapterError),

    #[error("device error: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to load asset `{path}`: {reason}")]
    Asset { path: String, reason: String },

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

impl SceneError {
    pub fn asset(path: &str, reason: impl ToString) -> Self {
        SceneError::Asset {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<SceneError> for wasm_bindgen::JsValue {
    fn from(e: SceneError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
