//! Rendering adapter: renderer-agnostic interface over the world.
//!
//! # Invariants
//! - Renderers read the world; they never mutate it.
//! - Model matrices come from the scene hierarchy, composed each frame.
//!
//! A debug text renderer stands in for a GPU backend. The trait is stable;
//! a real backend consumes the same [`DrawItem`] list.

mod renderer;

pub use renderer::{DebugTextRenderer, DrawItem, RenderView, Renderer, collect_draws};

pub fn crate_info() -> &'static str {
    "strafe-render v0.1.0"
}
