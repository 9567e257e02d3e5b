use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
///
/// The local-to-parent matrix is derived on demand from the three fields, so
/// systems may mutate them freely without invalidating anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Identity rotation and scale at `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    /// Decompose an affine matrix into position, rotation and scale.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let mut t = Self::IDENTITY;
        t.set_matrix(matrix);
        t
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local-to-parent matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Overwrite all three fields from an affine matrix. Shear is discarded.
    pub fn set_matrix(&mut self, matrix: Mat4) {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation.normalize();
        self.position = position;
    }

    /// Local +Y in parent space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Local -Z in parent space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Local +X in parent space.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Translate by a vector expressed in local axes.
    pub fn move_local(&mut self, delta: Vec3) {
        self.position += self.rotation * delta;
    }

    /// Apply `rotation` in parent space (pre-multiply).
    pub fn rotate(&mut self, rotation: Quat) {
        self.rotation = (rotation * self.rotation).normalize();
    }

    /// Apply `rotation` about the local axes (post-multiply).
    pub fn rotate_local(&mut self, rotation: Quat) {
        self.rotation = (self.rotation * rotation).normalize();
    }

    /// Place the transform at `eye` facing `target`.
    ///
    /// Leaves the rotation untouched when `eye` and `target` coincide.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.position = eye;
        if (target - eye).length_squared() <= f32::EPSILON {
            return;
        }
        let view = Mat4::look_at_rh(eye, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.rotation = rotation.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn set_matrix_roundtrips_trs() {
        let original = Transform::from_xyz(1.0, 2.0, 3.0)
            .with_rotation(Quat::from_rotation_y(0.7))
            .with_scale(Vec3::new(2.0, 1.0, 0.5));
        let decomposed = Transform::from_matrix(original.matrix());
        assert!(approx(decomposed.position, original.position));
        assert!(approx(decomposed.scale, original.scale));
        assert!(decomposed.rotation.angle_between(original.rotation) < 1e-4);
    }

    #[test]
    fn move_local_follows_rotation() {
        let mut t = Transform::default().with_rotation(Quat::from_rotation_y(
            std::f32::consts::FRAC_PI_2,
        ));
        // Facing -X after a quarter turn; local forward is -Z.
        t.move_local(Vec3::new(0.0, 0.0, -1.0));
        assert!(approx(t.position, Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn rotate_and_rotate_local_differ_in_order() {
        let yaw = Quat::from_rotation_y(0.5);
        let pitch = Quat::from_rotation_x(0.3);

        let mut world_space = Transform::default().with_rotation(pitch);
        world_space.rotate(yaw);
        assert!(world_space.rotation.angle_between(yaw * pitch) < 1e-5);

        let mut local_space = Transform::default().with_rotation(yaw);
        local_space.rotate_local(pitch);
        assert!(local_space.rotation.angle_between(yaw * pitch) < 1e-5);
    }

    #[test]
    fn look_at_faces_target() {
        let mut t = Transform::default();
        t.look_at(Vec3::new(0.0, 2.0, 5.0), Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        assert!(approx(t.forward(), Vec3::NEG_Z));
        assert!(approx(t.position, Vec3::new(0.0, 2.0, 5.0)));
    }
}
