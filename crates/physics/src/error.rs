use glam::Vec3;
use strafe_ecs::Entity;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("invalid ray from {origin} along {direction}")]
    InvalidRay { origin: Vec3, direction: Vec3 },
    #[error("entity {entity} still collides after {iterations} resolution steps")]
    Unresolved { entity: Entity, iterations: u32 },
}
