use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Physical keyboard keys the bindings can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    KeyW,
    KeyA,
    KeyS,
    KeyD,
    KeyQ,
    KeyE,
    KeyR,
    KeyF,
    KeyC,
    Space,
    ShiftLeft,
    ControlLeft,
    AltLeft,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// Snapshot of device state for one frame.
///
/// The platform layer feeds raw events in; systems only read. Mouse motion
/// accumulates until [`end_frame`](Self::end_frame).
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys_held: HashSet<KeyCode>,
    buttons_held: HashSet<u8>,
    mouse_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }
    }

    pub fn handle_mouse_button(&mut self, button: u8, pressed: bool) {
        if pressed {
            self.buttons_held.insert(button);
        } else {
            self.buttons_held.remove(&button);
        }
    }

    pub fn handle_mouse_motion(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn is_button_held(&self, button: u8) -> bool {
        self.buttons_held.contains(&button)
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Clear per-frame accumulators. Held keys and buttons persist.
    pub fn end_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
    }
}
