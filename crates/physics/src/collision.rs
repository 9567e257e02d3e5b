use glam::Vec3;
use serde::{Deserialize, Serialize};
use strafe_common::Transform;
use strafe_ecs::{Entity, World};

use crate::shapes::{Cylinder, OrientedBox, cylinder_box_penetration};
use crate::{BoxCollider, CylinderCollider, PhysicsError};

/// Contact between a cylinder and the deepest box it overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionResult {
    /// Unit vector pointing from the box toward the cylinder.
    pub normal: Vec3,
    /// Distance to push along `normal` to separate the shapes.
    pub penetration_depth: f32,
}

/// Nearest shape hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastHit {
    pub entity: Entity,
    /// Distance along the normalised ray direction.
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Test a cylinder placed at `transform` against every static box in the
/// world, ignoring `entity` itself.
///
/// Returns the overlap with the largest penetration depth. On equal depth
/// the box that comes first in `BoxCollider` store order wins.
pub fn find_first_collision(
    world: &World,
    entity: Entity,
    transform: &Transform,
    collider: &CylinderCollider,
) -> Option<CollisionResult> {
    let boxes = world.store::<BoxCollider>()?;
    let cylinder = Cylinder::new(transform, collider);

    let mut deepest: Option<CollisionResult> = None;
    for (other, box_collider) in boxes.iter() {
        if other == entity || world.is_pending_destroy(other) {
            continue;
        }
        let Some(box_transform) = world.try_get::<Transform>(other) else {
            continue;
        };
        let obb = OrientedBox::new(box_transform, box_collider);
        let Some(hit) = cylinder_box_penetration(&cylinder, &obb) else {
            continue;
        };
        if deepest.is_none_or(|d| hit.penetration_depth > d.penetration_depth) {
            deepest = Some(hit);
        }
    }
    deepest
}

/// Cast a ray against every box and cylinder collider in the world.
///
/// `direction` need not be normalised; `t` in the result is in world units.
/// Shapes that contain `origin` are not reported. On equal distance boxes
/// win over cylinders, then store order decides.
pub fn cast_ray(
    world: &World,
    origin: Vec3,
    direction: Vec3,
) -> Result<Option<RayCastHit>, PhysicsError> {
    let length = direction.length();
    if !origin.is_finite() || !length.is_finite() || length <= f32::EPSILON {
        return Err(PhysicsError::InvalidRay { origin, direction });
    }
    let dir = direction / length;

    let mut nearest: Option<RayCastHit> = None;
    let mut consider = |entity: Entity, hit: Option<(f32, Vec3)>| {
        if let Some((t, normal)) = hit {
            if nearest.is_none_or(|n| t < n.t) {
                nearest = Some(RayCastHit {
                    entity,
                    t,
                    point: origin + dir * t,
                    normal,
                });
            }
        }
    };

    if let Some(boxes) = world.store::<BoxCollider>() {
        for (entity, collider) in boxes.iter() {
            if world.is_pending_destroy(entity) {
                continue;
            }
            if let Some(transform) = world.try_get::<Transform>(entity) {
                consider(entity, OrientedBox::new(transform, collider).ray_hit(origin, dir));
            }
        }
    }
    if let Some(cylinders) = world.store::<CylinderCollider>() {
        for (entity, collider) in cylinders.iter() {
            if world.is_pending_destroy(entity) {
                continue;
            }
            if let Some(transform) = world.try_get::<Transform>(entity) {
                consider(entity, Cylinder::new(transform, collider).ray_hit(origin, dir));
            }
        }
    }

    tracing::trace!(%origin, %dir, hit = ?nearest.map(|h| h.entity), "ray cast");
    Ok(nearest)
}
