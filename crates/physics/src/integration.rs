use serde::{Deserialize, Serialize};
use strafe_common::Transform;
use strafe_ecs::{Entity, World};

use crate::{CylinderCollider, PhysicsError, Velocity, find_first_collision};

/// Integration and collision-resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// Push-out steps per entity per frame before giving up.
    pub max_resolve_iterations: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_resolve_iterations: 8,
        }
    }
}

/// What one [`integration_system`] run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrationReport {
    /// Entities whose position was advanced.
    pub moved: usize,
    /// Push-out steps applied across all entities.
    pub contacts: usize,
    /// Entities still overlapping geometry after the iteration cap.
    pub unresolved: Vec<Entity>,
}

/// Advance every `{Transform, Velocity}` entity by `velocity * dt`, then push
/// each one carrying a [`CylinderCollider`] out of the static boxes.
pub fn integration_system(world: &mut World, config: &PhysicsConfig, dt: f32) -> IntegrationReport {
    let _span = tracing::info_span!("integration_system", dt).entered();
    let mut report = IntegrationReport::default();

    world.query::<(&mut Transform, &Velocity)>(|_, (transform, velocity)| {
        transform.position += velocity.0 * dt;
        report.moved += 1;
    });

    for entity in world.entities_with::<(&Transform, &Velocity, &CylinderCollider)>() {
        match resolve_collisions(world, entity, config.max_resolve_iterations) {
            Ok(steps) => report.contacts += steps as usize,
            Err(err) => {
                tracing::warn!(%entity, %err, "collision left unresolved");
                report.contacts += config.max_resolve_iterations as usize;
                report.unresolved.push(entity);
            }
        }
    }

    tracing::debug!(
        moved = report.moved,
        contacts = report.contacts,
        unresolved = report.unresolved.len(),
        "integration complete"
    );
    report
}

/// Repeatedly push `entity` out of the deepest overlapping box, sliding its
/// velocity along each contact normal. Returns the number of push-out steps.
///
/// The entity keeps its last pushed position even when the cap is hit.
///
/// Panics if `entity` is stale or lacks a `Transform` or `CylinderCollider`.
#[track_caller]
pub fn resolve_collisions(
    world: &mut World,
    entity: Entity,
    max_iterations: u32,
) -> Result<u32, PhysicsError> {
    let collider = *world.get::<CylinderCollider>(entity);
    let mut transform = *world.get::<Transform>(entity);

    let mut steps = 0;
    let outcome = loop {
        let Some(hit) = find_first_collision(world, entity, &transform, &collider) else {
            break Ok(steps);
        };
        if steps == max_iterations {
            break Err(PhysicsError::Unresolved {
                entity,
                iterations: max_iterations,
            });
        }
        transform.position += hit.normal * hit.penetration_depth;
        if let Some(velocity) = world.try_get_mut::<Velocity>(entity) {
            velocity.slide(hit.normal);
        }
        steps += 1;
        tracing::trace!(%entity, step = steps, depth = hit.penetration_depth, "pushed out");
    };

    world.get_mut::<Transform>(entity).position = transform.position;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxCollider;
    use glam::Vec3;

    fn spawn_box(world: &mut World, center: Vec3, half: Vec3) -> Entity {
        let e = world.create_entity();
        world.add(e, Transform::from_position(center));
        world.add(e, BoxCollider { half_extents: half });
        e
    }

    fn spawn_mover(world: &mut World, position: Vec3, velocity: Vec3, radius: f32) -> Entity {
        let e = world.create_entity();
        world.add(e, Transform::from_position(position));
        world.add(e, Velocity(velocity));
        world.add(e, CylinderCollider { radius, height: 2.0 });
        e
    }

    #[test]
    fn free_motion_integrates_velocity() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add(e, Transform::IDENTITY);
        world.add(e, Velocity(Vec3::new(1.0, 0.0, -2.0)));

        let report = integration_system(&mut world, &PhysicsConfig::default(), 0.5);
        assert_eq!(report.moved, 1);
        assert_eq!(report.contacts, 0);
        assert_eq!(
            world.get::<Transform>(e).position,
            Vec3::new(0.5, 0.0, -1.0)
        );
    }

    #[test]
    fn landing_on_floor_pushes_out_and_slides() {
        let mut world = World::new();
        spawn_box(&mut world, Vec3::new(0.0, -1.0, 0.0), Vec3::new(5.0, 1.0, 5.0));
        let e = spawn_mover(&mut world, Vec3::new(0.0, 1.2, 0.0), Vec3::new(1.0, -1.0, 0.0), 0.5);

        let report = integration_system(&mut world, &PhysicsConfig::default(), 1.0);
        assert!(report.unresolved.is_empty());
        assert!(report.contacts >= 1);

        let p = world.get::<Transform>(e).position;
        assert!((p.y - 1.0).abs() < 1e-4);
        assert!((p.x - 1.0).abs() < 1e-5);
        let v = world.get::<Velocity>(e).0;
        assert!(v.y.abs() < 1e-5);
        assert!((v.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn squeezed_between_boxes_reports_unresolved() {
        let mut world = World::new();
        spawn_box(&mut world, Vec3::new(-1.75, 0.0, 0.0), Vec3::new(1.25, 10.0, 10.0));
        spawn_box(&mut world, Vec3::new(1.75, 0.0, 0.0), Vec3::new(1.25, 10.0, 10.0));
        let e = spawn_mover(&mut world, Vec3::ZERO, Vec3::ZERO, 1.0);

        let config = PhysicsConfig {
            max_resolve_iterations: 8,
        };
        let report = integration_system(&mut world, &config, 0.016);
        assert_eq!(report.unresolved, vec![e]);
        assert!(world.get::<Transform>(e).position.is_finite());
    }

    #[test]
    fn resolve_without_overlap_takes_no_steps() {
        let mut world = World::new();
        let e = spawn_mover(&mut world, Vec3::ZERO, Vec3::ZERO, 0.5);
        assert_eq!(resolve_collisions(&mut world, e, 4), Ok(0));
    }

    #[test]
    fn zero_iteration_cap_with_overlap_is_unresolved() {
        let mut world = World::new();
        spawn_box(&mut world, Vec3::new(0.0, -1.5, 0.0), Vec3::new(5.0, 1.0, 5.0));
        let e = spawn_mover(&mut world, Vec3::ZERO, Vec3::ZERO, 0.5);
        assert_eq!(
            resolve_collisions(&mut world, e, 0),
            Err(PhysicsError::Unresolved {
                entity: e,
                iterations: 0
            })
        );
        assert_eq!(world.get::<Transform>(e).position, Vec3::ZERO);
    }

    #[test]
    fn pending_movers_are_skipped() {
        let mut world = World::new();
        let e = spawn_mover(&mut world, Vec3::ZERO, Vec3::X, 0.5);
        world.destroy(e);
        let report = integration_system(&mut world, &PhysicsConfig::default(), 1.0);
        assert_eq!(report.moved, 0);
        assert_eq!(world.get::<Transform>(e).position, Vec3::ZERO);
    }
}
