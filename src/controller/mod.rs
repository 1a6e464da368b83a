// CONTROLLER: Input, per-frame updates, and the frame loop state
pub mod frame_loop;
pub mod frame_updater;
pub mod input;
pub mod orbit_controls;
pub mod resize;

pub use frame_loop::{FrameStats, SceneContext};
pub use frame_updater::update_frame;
pub use input::{InputEvent, InputProcessor, InputState, MouseButton};
pub use orbit_controls::{CameraOrbit, OrbitControls};
pub use resize::apply_resize;
