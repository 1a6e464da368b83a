use std::collections::BTreeMap;

use glam::Vec2;

pub const TIME_UNIFORM: &str = "uTime";
pub const RESOLUTION_UNIFORM: &str = "resolution";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
}

/// Named uniform values of one shader material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderState {
    uniforms: BTreeMap<String, UniformValue>,
}

impl ShaderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State with `uTime = 0` and `resolution = (0, 0)`.
    pub fn timed() -> Self {
        Self::new()
            .with(TIME_UNIFORM, UniformValue::Float(0.0))
            .with(RESOLUTION_UNIFORM, UniformValue::Vec2(Vec2::ZERO))
    }

    pub fn with(mut self, name: &str, value: UniformValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<Vec2> {
        match self.get(name)? {
            UniformValue::Vec2(v) => Some(v),
            _ => None,
        }
    }

    pub fn has_time(&self) -> bool {
        self.uniforms.contains_key(TIME_UNIFORM)
    }

    pub fn set_time(&mut self, elapsed: f32) {
        self.set(TIME_UNIFORM, UniformValue::Float(elapsed));
    }

    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_state_starts_at_zero() {
        let state = ShaderState::timed();
        assert_eq!(state.float(TIME_UNIFORM), Some(0.0));
        assert_eq!(state.vec2(RESOLUTION_UNIFORM), Some(Vec2::ZERO));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn set_time_overwrites_value() {
        let mut state = ShaderState::timed();
        state.set_time(3.25);
        state.set_time(4.5);
        assert_eq!(state.float(TIME_UNIFORM), Some(4.5));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn typed_getters_reject_mismatched_kinds() {
        let state = ShaderState::timed();
        assert_eq!(state.vec2(TIME_UNIFORM), None);
        assert_eq!(state.float(RESOLUTION_UNIFORM), None);
        assert_eq!(state.float("missing"), None);
    }
}
