//! Player input: device snapshots, bindings and the control system.
//!
//! # Invariants
//! - Systems never see raw device events, only an [`InputState`] snapshot.
//! - Bindings are data; remapping a key never touches control logic.

mod binding;
mod control;
mod state;

pub use binding::{AnalogBinding, AnalogInput, BinaryBinding, BinaryInput, axis_value};
pub use control::{ControlBindings, ControlConfig, PlayerInputController, player_control_system};
pub use state::{InputState, KeyCode};

pub fn crate_info() -> &'static str {
    "strafe-input v0.1.0"
}
