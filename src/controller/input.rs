/// Platform-agnostic input handling

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),

    // Pointer events, coordinates in logical pixels
    PointerDown { button: MouseButton, x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { button: MouseButton },
    Wheel { delta_y: f32 },

    // Window events
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// Input-driven toggles that are not part of the orbit control.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub hud_visible: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &InputEvent) {
        if let InputEvent::KeyDown(key) = event {
            if InputProcessor::wants_to_toggle_hud(key) {
                self.hud_visible = !self.hud_visible;
            }
        }
    }
}

/// Key mapping helpers shared by the web and native front ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputProcessor;

impl InputProcessor {
    pub fn wants_to_toggle_hud(key: &str) -> bool {
        matches!(key, "h" | "H")
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::{InputEvent, MouseButton};
    use web_sys::{MouseEvent, WheelEvent};

    pub fn mouse_down_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerDown {
            button: MouseButton::from_web_button(e.button()),
            x: e.client_x() as f32,
            y: e.client_y() as f32,
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerMove {
            x: e.client_x() as f32,
            y: e.client_y() as f32,
        }
    }

    pub fn mouse_up_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerUp {
            button: MouseButton::from_web_button(e.button()),
        }
    }

    pub fn wheel_to_input(e: &WheelEvent) -> InputEvent {
        InputEvent::Wheel { delta_y: e.delta_y() as f32 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_buttons_map_to_mouse_buttons() {
        assert_eq!(MouseButton::from_web_button(0), MouseButton::Left);
        assert_eq!(MouseButton::from_web_button(1), MouseButton::Middle);
        assert_eq!(MouseButton::from_web_button(2), MouseButton::Right);
        assert_eq!(MouseButton::from_web_button(9), MouseButton::Left);
    }

    #[test]
    fn h_toggles_hud() {
        let mut state = InputState::new();
        state.process_event(&InputEvent::KeyDown("h".into()));
        assert!(state.hud_visible);
        state.process_event(&InputEvent::KeyDown("x".into()));
        assert!(state.hud_visible);
        state.process_event(&InputEvent::KeyDown("H".into()));
        assert!(!state.hud_visible);
    }
}
