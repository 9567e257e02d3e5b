//! World-space shapes built from a `Transform` plus a collider, and the raw
//! geometric tests between them.

use glam::{Quat, Vec3};
use strafe_common::Transform;
use strafe_common::math::sign;

use crate::{BoxCollider, CollisionResult, CylinderCollider};

/// Overlaps at or below this depth count as touching, not colliding.
pub const CONTACT_EPSILON: f32 = 1e-4;

const AXIS_EPSILON: f32 = 1e-6;
const PARALLEL_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy)]
pub(crate) struct OrientedBox {
    pub center: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
}

impl OrientedBox {
    pub fn new(transform: &Transform, collider: &BoxCollider) -> Self {
        Self {
            center: transform.position,
            rotation: transform.rotation,
            half_extents: collider.half_extents * transform.scale.abs(),
        }
    }

    pub fn axes(&self) -> [Vec3; 3] {
        [
            self.rotation * Vec3::X,
            self.rotation * Vec3::Y,
            self.rotation * Vec3::Z,
        ]
    }

    /// Half-length of the box projected onto unit axis `n`.
    pub fn extent_along(&self, n: Vec3) -> f32 {
        self.axes()
            .iter()
            .zip(self.half_extents.to_array())
            .map(|(u, e)| e * u.dot(n).abs())
            .sum()
    }

    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * (p - self.center);
        self.center + self.rotation * local.clamp(-self.half_extents, self.half_extents)
    }

    /// Slab test in box space. Returns the entry distance and the world-space
    /// face normal, or `None` if the ray misses, the box is behind the origin,
    /// or the origin is inside.
    pub fn ray_hit(&self, origin: Vec3, direction: Vec3) -> Option<(f32, Vec3)> {
        let inv = self.rotation.inverse();
        let o = inv * (origin - self.center);
        let d = inv * direction;

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        let mut near_normal = Vec3::ZERO;
        for i in 0..3 {
            let e = self.half_extents[i];
            if d[i].abs() < PARALLEL_EPSILON {
                if o[i].abs() > e {
                    return None;
                }
                continue;
            }
            let t1 = (-e - o[i]) / d[i];
            let t2 = (e - o[i]) / d[i];
            let (enter, exit) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
            if enter > t_near {
                t_near = enter;
                near_normal = Vec3::ZERO;
                near_normal[i] = -sign(d[i]);
            }
            t_far = t_far.min(exit);
            if t_near > t_far {
                return None;
            }
        }
        (t_near >= 0.0).then(|| (t_near, self.rotation * near_normal))
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Cylinder {
    pub center: Vec3,
    pub rotation: Quat,
    pub radius: f32,
    pub half_height: f32,
}

impl Cylinder {
    pub fn new(transform: &Transform, collider: &CylinderCollider) -> Self {
        Self {
            center: transform.position,
            rotation: transform.rotation,
            radius: collider.radius,
            half_height: collider.height * 0.5,
        }
    }

    pub fn axis(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Support half-length along unit axis `n`: `h/2·|a·n| + r·√(1−(a·n)²)`.
    pub fn extent_along(&self, n: Vec3) -> f32 {
        let c = self.axis().dot(n);
        self.half_height * c.abs() + self.radius * (1.0 - c * c).max(0.0).sqrt()
    }

    pub fn contains(&self, p: Vec3) -> bool {
        let local = self.rotation.inverse() * (p - self.center);
        local.y.abs() <= self.half_height
            && local.x * local.x + local.z * local.z <= self.radius * self.radius
    }

    /// Side quadratic plus both caps in cylinder space. Same contract as
    /// [`OrientedBox::ray_hit`].
    pub fn ray_hit(&self, origin: Vec3, direction: Vec3) -> Option<(f32, Vec3)> {
        if self.contains(origin) {
            return None;
        }
        let inv = self.rotation.inverse();
        let o = inv * (origin - self.center);
        let d = inv * direction;
        let (r, hh) = (self.radius, self.half_height);
        let mut best = None;

        let a = d.x * d.x + d.z * d.z;
        if a > PARALLEL_EPSILON {
            let b = 2.0 * (o.x * d.x + o.z * d.z);
            let c = o.x * o.x + o.z * o.z - r * r;
            let disc = b * b - 4.0 * a * c;
            if disc >= 0.0 {
                let sq = disc.sqrt();
                for t in [(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)] {
                    let p = o + d * t;
                    if p.y.abs() <= hh {
                        keep_nearest(&mut best, t, Vec3::new(p.x, 0.0, p.z).normalize_or_zero());
                    }
                }
            }
        }

        if d.y.abs() > PARALLEL_EPSILON {
            for (cap, normal) in [(hh, Vec3::Y), (-hh, Vec3::NEG_Y)] {
                let t = (cap - o.y) / d.y;
                let p = o + d * t;
                if p.x * p.x + p.z * p.z <= r * r {
                    keep_nearest(&mut best, t, normal);
                }
            }
        }

        best.map(|(t, n)| (t, self.rotation * n))
    }
}

fn keep_nearest(best: &mut Option<(f32, Vec3)>, t: f32, normal: Vec3) {
    if t >= 0.0 && best.is_none_or(|(bt, _)| t < bt) {
        *best = Some((t, normal));
    }
}

/// Separating-axis test of a cylinder against a box.
///
/// Candidate axes: the three box face normals, the cylinder axis, the
/// cylinder axis crossed with each box edge direction, and the direction from
/// the box's closest point to the cylinder (both raw and perpendicular to the
/// axis). The axis of least overlap wins; the normal points from the box
/// toward the cylinder.
pub(crate) fn cylinder_box_penetration(
    cylinder: &Cylinder,
    obb: &OrientedBox,
) -> Option<CollisionResult> {
    let axis = cylinder.axis();
    let box_axes = obb.axes();

    let mut candidates = Vec::with_capacity(9);
    candidates.extend(box_axes);
    candidates.push(axis);
    for u in box_axes {
        push_axis(&mut candidates, axis.cross(u));
    }
    let to_center = cylinder.center - obb.closest_point(cylinder.center);
    push_axis(&mut candidates, to_center - axis * to_center.dot(axis));
    push_axis(&mut candidates, to_center);

    let offset = cylinder.center - obb.center;
    let mut best: Option<CollisionResult> = None;
    for n in candidates {
        let distance = offset.dot(n);
        let overlap = obb.extent_along(n) + cylinder.extent_along(n) - distance.abs();
        if overlap <= CONTACT_EPSILON {
            return None;
        }
        if best.is_none_or(|b| overlap < b.penetration_depth) {
            best = Some(CollisionResult {
                normal: if distance < 0.0 { -n } else { n },
                penetration_depth: overlap,
            });
        }
    }
    best
}

fn push_axis(axes: &mut Vec<Vec3>, v: Vec3) {
    if v.length_squared() > AXIS_EPSILON {
        axes.push(v.normalize());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cylinder_at(p: Vec3, radius: f32, height: f32) -> Cylinder {
        Cylinder::new(
            &Transform::from_position(p),
            &CylinderCollider { radius, height },
        )
    }

    fn box_at(p: Vec3, half: Vec3) -> OrientedBox {
        OrientedBox::new(
            &Transform::from_position(p),
            &BoxCollider { half_extents: half },
        )
    }

    #[test]
    fn extent_of_upright_cylinder() {
        let c = cylinder_at(Vec3::ZERO, 0.5, 2.0);
        assert!((c.extent_along(Vec3::Y) - 1.0).abs() < 1e-6);
        assert!((c.extent_along(Vec3::X) - 0.5).abs() < 1e-6);
        let diag = Vec3::new(1.0, 1.0, 0.0).normalize();
        let expected = 1.0 * diag.y + 0.5 * diag.x;
        assert!((c.extent_along(diag) - expected).abs() < 1e-6);
    }

    #[test]
    fn scaled_box_extents() {
        let t = Transform::IDENTITY.with_scale(Vec3::new(2.0, -1.0, 3.0));
        let b = OrientedBox::new(&t, &BoxCollider::default());
        assert_eq!(b.half_extents, Vec3::new(1.0, 0.5, 1.5));
    }

    #[test]
    fn resting_on_floor_overlap() {
        let c = cylinder_at(Vec3::ZERO, 0.5, 2.0);
        let b = box_at(Vec3::new(0.0, -1.5, 0.0), Vec3::new(5.0, 1.0, 5.0));
        let hit = cylinder_box_penetration(&c, &b).unwrap();
        assert!((hit.normal - Vec3::Y).length() < 1e-5);
        assert!((hit.penetration_depth - 0.5).abs() < 1e-5);
    }

    #[test]
    fn beside_a_corner_is_separated() {
        // Axis-aligned projections overlap, only the corner axis separates.
        let c = cylinder_at(Vec3::new(1.4, 0.0, 1.4), 0.5, 2.0);
        let b = box_at(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0));
        assert!(cylinder_box_penetration(&c, &b).is_none());
    }

    #[test]
    fn touching_is_not_colliding() {
        let c = cylinder_at(Vec3::ZERO, 0.5, 2.0);
        let b = box_at(Vec3::new(0.0, -2.0, 0.0), Vec3::new(5.0, 1.0, 5.0));
        assert!(cylinder_box_penetration(&c, &b).is_none());
    }

    #[test]
    fn rotated_box_face_normal() {
        // A wall rotated a quarter turn about Y; its local X becomes world -Z.
        let t = Transform::from_xyz(0.0, 0.0, -1.0)
            .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let b = OrientedBox::new(
            &t,
            &BoxCollider {
                half_extents: Vec3::new(0.75, 5.0, 5.0),
            },
        );
        let c = cylinder_at(Vec3::ZERO, 0.5, 2.0);
        let hit = cylinder_box_penetration(&c, &b).unwrap();
        assert!((hit.normal - Vec3::Z).length() < 1e-4);
        assert!((hit.penetration_depth - 0.25).abs() < 1e-4);
    }

    #[test]
    fn ray_box_entry_and_normal() {
        let b = box_at(Vec3::new(0.0, 0.0, -5.0), Vec3::splat(0.5));
        let (t, n) = b.ray_hit(Vec3::ZERO, Vec3::NEG_Z).unwrap();
        assert!((t - 4.5).abs() < 1e-5);
        assert!((n - Vec3::Z).length() < 1e-5);
        assert!(b.ray_hit(Vec3::ZERO, Vec3::Z).is_none());
        assert!(b.ray_hit(Vec3::new(0.0, 0.0, -5.0), Vec3::Z).is_none());
    }

    #[test]
    fn ray_cylinder_side_and_cap() {
        let c = cylinder_at(Vec3::ZERO, 1.0, 2.0);
        let (t, n) = c.ray_hit(Vec3::new(-5.0, 0.0, 0.0), Vec3::X).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert!((n - Vec3::NEG_X).length() < 1e-5);

        let (t, n) = c.ray_hit(Vec3::new(0.2, 10.0, 0.0), Vec3::NEG_Y).unwrap();
        assert!((t - 9.0).abs() < 1e-5);
        assert!((n - Vec3::Y).length() < 1e-5);

        assert!(c.ray_hit(Vec3::new(-5.0, 3.0, 0.0), Vec3::X).is_none());
        assert!(c.ray_hit(Vec3::ZERO, Vec3::X).is_none());
    }
}
