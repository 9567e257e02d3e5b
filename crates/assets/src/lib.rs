//! Scene import: JSON scene descriptions turned into entity hierarchies.
//!
//! A scene is a material table, a mesh table and a flat node list; nodes
//! reference children and meshes by index. The renderer resolves `MeshRef`
//! against the mesh table, never by file path.
//!
//! # Invariants
//! - Imports are all-or-nothing: validation runs before any entity exists.
//! - Every node has exactly one parent or is a root; no cycles.

mod description;
mod error;
mod import;

pub use description::{
    ColliderDescription, MaterialDescription, MeshDescription, NodeDescription, SceneDescription,
};
pub use error::AssetError;
pub use import::{ImportedScene, SceneImporter};

pub fn crate_info() -> &'static str {
    "strafe-assets v0.1.0"
}
