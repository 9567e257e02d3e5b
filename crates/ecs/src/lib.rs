//! Entity/component storage runtime.
//!
//! Components are stored per type in sparse sets keyed by entity slot. The
//! world keeps one store per component type behind a type-erased registry.
//!
//! # Invariants
//! - A stale handle (generation mismatch) never reaches component data.
//! - At most one component of each type per entity; `add` never overwrites.
//! - Destruction is deferred: only `World::flush` frees slots and strips stores.

mod entity;
mod error;
pub mod query;
mod store;
mod world;

pub use entity::Entity;
pub use error::EcsError;
pub use query::QueryParam;
pub use store::{AnyStore, Component, ComponentStore};
pub use world::World;

pub fn crate_info() -> &'static str {
    "strafe-ecs v0.1.0"
}
