use serde::{Deserialize, Serialize};

use crate::{InputState, KeyCode};

/// Source of an on/off signal.
pub trait BinaryInput {
    fn is_active(&self, input: &InputState) -> bool;
}

/// Source of a continuous per-frame value.
pub trait AnalogInput {
    fn value(&self, input: &InputState) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryBinding {
    Key(KeyCode),
    MouseButton(u8),
}

impl BinaryInput for BinaryBinding {
    fn is_active(&self, input: &InputState) -> bool {
        match *self {
            Self::Key(key) => input.is_key_held(key),
            Self::MouseButton(button) => input.is_button_held(button),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalogBinding {
    MouseX,
    MouseY,
}

impl AnalogInput for AnalogBinding {
    fn value(&self, input: &InputState) -> f32 {
        match self {
            Self::MouseX => input.mouse_delta().x,
            Self::MouseY => input.mouse_delta().y,
        }
    }
}

/// `1.0` while held, else `0.0`.
pub fn axis_value(binding: &impl BinaryInput, input: &InputState) -> f32 {
    if binding.is_active(input) { 1.0 } else { 0.0 }
}
