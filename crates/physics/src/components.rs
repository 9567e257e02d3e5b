use glam::Vec3;
use serde::{Deserialize, Serialize};

/// World-space velocity in units per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

impl Velocity {
    /// Drop the part of the velocity heading into a surface with outward
    /// normal `normal`. Tangential motion is kept.
    pub fn slide(&mut self, normal: Vec3) {
        let into = self.0.dot(normal);
        if into < 0.0 {
            self.0 -= normal * into;
        }
    }
}

/// Upright cylinder centred on the entity position, axis along local up.
/// Ignores the transform's scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderCollider {
    pub radius: f32,
    pub height: f32,
}

impl Default for CylinderCollider {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 1.8,
        }
    }
}

/// Static box oriented by the entity rotation. Half extents are multiplied
/// by the absolute transform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxCollider {
    pub half_extents: Vec3,
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self {
            half_extents: Vec3::splat(0.5),
        }
    }
}
