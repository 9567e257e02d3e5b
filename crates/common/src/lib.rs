//! Shared types for the strafe simulation core.
//!
//! # Invariants
//! - `Transform::rotation` is kept normalized by every mutating helper.
//! - Nothing here touches the world; these are plain values.

pub mod math;
mod types;

pub use glam;
pub use types::Transform;

pub fn crate_info() -> &'static str {
    "strafe-common v0.1.0"
}
