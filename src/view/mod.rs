// VIEW: GPU resources and frame submission
pub mod assets;
pub mod bloom;
pub mod dispatcher;
pub mod gpu_init;
pub mod mesh;
pub mod render;
pub mod texture;
pub mod uniforms;

pub use bloom::{BloomPipeline, BloomSettings};
pub use dispatcher::{FrameOutcome, HudFrame, RenderDispatcher, RenderRoute};
pub use gpu_init::GpuContext;
pub use render::SceneRenderer;
