//! Scene graph on top of the entity world.
//!
//! # Invariants
//! - Every child listed under a parent names that parent, and every entity
//!   naming a parent appears exactly once in that parent's child list.
//! - `prev_sibling`/`next_sibling` are mutual inverses within one list.
//! - Links are navigation only; destroying a parent never destroys children.

mod components;
mod hierarchy;

pub use components::{MeshRef, Name};
pub use hierarchy::{
    Ancestors, Children, Hierarchy, ancestors, children, destroy_recursive, detach_and_destroy,
    remove_parent, set_parent, world_matrix,
};

pub fn crate_info() -> &'static str {
    "strafe-scene v0.1.0"
}
