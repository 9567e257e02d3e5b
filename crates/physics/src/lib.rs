//! Physics: a dynamic cylinder against static boxes, plus ray casts.
//!
//! # Invariants
//! - Collision normals point from the static box toward the cylinder.
//! - Resolution never loops unbounded; `PhysicsConfig::max_resolve_iterations`
//!   caps the push-out steps and the overflow is reported, not panicked.
//! - Entities pending destruction are invisible to collision and ray queries.

mod collision;
mod components;
mod error;
mod integration;
mod shapes;

pub use collision::{CollisionResult, RayCastHit, cast_ray, find_first_collision};
pub use components::{BoxCollider, CylinderCollider, Velocity};
pub use error::PhysicsError;
pub use integration::{IntegrationReport, PhysicsConfig, integration_system, resolve_collisions};
pub use shapes::CONTACT_EPSILON;

pub fn crate_info() -> &'static str {
    "strafe-physics v0.1.0"
}
