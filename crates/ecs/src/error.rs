use crate::Entity;

/// Contract violations detected by the world.
///
/// The panicking accessors (`World::add`, `World::get`, ...) panic with the
/// display text of these; the `try_*` variants hand them back instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("entity {0} is stale or was never created")]
    StaleEntity(Entity),
    #[error("entity {entity} already has a {component} component")]
    DuplicateComponent {
        entity: Entity,
        component: &'static str,
    },
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },
}
