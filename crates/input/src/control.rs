use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use strafe_common::Transform;
use strafe_ecs::World;
use strafe_physics::Velocity;

use crate::binding::axis_value;
use crate::{AnalogBinding, AnalogInput, BinaryBinding, BinaryInput, InputState, KeyCode};

/// Which device signal drives each player action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlBindings {
    pub forward: BinaryBinding,
    pub back: BinaryBinding,
    pub left: BinaryBinding,
    pub right: BinaryBinding,
    pub up: BinaryBinding,
    pub down: BinaryBinding,
    pub fast: BinaryBinding,
    pub look_toggle: BinaryBinding,
    pub look_x: AnalogBinding,
    pub look_y: AnalogBinding,
}

impl Default for ControlBindings {
    fn default() -> Self {
        Self {
            forward: BinaryBinding::Key(KeyCode::KeyW),
            back: BinaryBinding::Key(KeyCode::KeyS),
            left: BinaryBinding::Key(KeyCode::KeyA),
            right: BinaryBinding::Key(KeyCode::KeyD),
            up: BinaryBinding::Key(KeyCode::KeyR),
            down: BinaryBinding::Key(KeyCode::KeyF),
            fast: BinaryBinding::Key(KeyCode::ShiftLeft),
            look_toggle: BinaryBinding::MouseButton(1),
            look_x: AnalogBinding::MouseX,
            look_y: AnalogBinding::MouseY,
        }
    }
}

/// Movement speeds, mouse-look sensitivity and bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// Units per second without the fast modifier.
    pub slow_speed: f32,
    /// Units per second while the fast modifier is held.
    pub fast_speed: f32,
    /// Radians per unit of mouse motion.
    pub look_sensitivity: f32,
    pub bindings: ControlBindings,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            slow_speed: 2.0,
            fast_speed: 10.0,
            look_sensitivity: 0.01,
            bindings: ControlBindings::default(),
        }
    }
}

/// Marks an entity as driven by player input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInputController {
    pub config: ControlConfig,
}

impl PlayerInputController {
    pub fn new(config: ControlConfig) -> Self {
        Self { config }
    }

    /// Yaw (x) and pitch (y) in radians for this frame; zero unless the look
    /// toggle is held.
    pub fn look(&self, input: &InputState) -> Vec2 {
        let b = &self.config.bindings;
        if !b.look_toggle.is_active(input) {
            return Vec2::ZERO;
        }
        Vec2::new(b.look_x.value(input), b.look_y.value(input)) * self.config.look_sensitivity
    }

    /// Desired velocity in the entity's local frame: right is +X, up is +Y,
    /// forward is -Z.
    pub fn local_velocity(&self, input: &InputState) -> Vec3 {
        let b = &self.config.bindings;
        let forward = axis_value(&b.forward, input) - axis_value(&b.back, input);
        let sideways = axis_value(&b.right, input) - axis_value(&b.left, input);
        let updown = axis_value(&b.up, input) - axis_value(&b.down, input);
        let speed = if b.fast.is_active(input) {
            self.config.fast_speed
        } else {
            self.config.slow_speed
        };
        Vec3::new(sideways, updown, -forward) * speed
    }
}

/// Turn input into rotation and desired velocity for every
/// `{PlayerInputController, Transform, Velocity}` entity.
///
/// Velocity is a rate, so `dt` does not scale it. Collisions are left to the
/// integration step. Returns the number of entities driven.
pub fn player_control_system(world: &mut World, input: &InputState, dt: f32) -> usize {
    let _span = tracing::info_span!("player_control_system", dt).entered();
    let mut driven = 0;
    world.query::<(&PlayerInputController, &mut Transform, &mut Velocity)>(
        |_, (controller, transform, velocity)| {
            let look = controller.look(input);
            if look != Vec2::ZERO {
                transform.rotate(Quat::from_axis_angle(Vec3::Y, -look.x));
                transform.rotate_local(Quat::from_axis_angle(Vec3::X, -look.y));
            }
            velocity.0 = transform.rotation * controller.local_velocity(input);
            driven += 1;
        },
    );
    driven
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;
    use strafe_ecs::Entity;

    fn spawn_player(world: &mut World, transform: Transform) -> Entity {
        let e = world.create_entity();
        world.add(e, PlayerInputController::default());
        world.add(e, transform);
        world.add(e, Velocity::default());
        e
    }

    fn held(keys: &[KeyCode]) -> InputState {
        let mut input = InputState::new();
        for &k in keys {
            input.handle_key(k, true);
        }
        input
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn idle_input_stops_the_player() {
        let mut world = World::new();
        let e = spawn_player(&mut world, Transform::IDENTITY);
        world.get_mut::<Velocity>(e).0 = Vec3::ONE;

        assert_eq!(player_control_system(&mut world, &InputState::new(), 0.016), 1);
        assert_eq!(world.get::<Velocity>(e).0, Vec3::ZERO);
    }

    #[test]
    fn forward_moves_along_negative_z_at_slow_speed() {
        let mut world = World::new();
        let e = spawn_player(&mut world, Transform::IDENTITY);
        player_control_system(&mut world, &held(&[KeyCode::KeyW]), 0.016);
        assert!(approx(world.get::<Velocity>(e).0, Vec3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn fast_modifier_and_combined_axes() {
        let mut world = World::new();
        let e = spawn_player(&mut world, Transform::IDENTITY);
        let input = held(&[KeyCode::KeyD, KeyCode::KeyR, KeyCode::KeyS, KeyCode::ShiftLeft]);
        player_control_system(&mut world, &input, 0.016);
        assert!(approx(world.get::<Velocity>(e).0, Vec3::new(10.0, 10.0, 10.0)));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut world = World::new();
        let e = spawn_player(&mut world, Transform::IDENTITY);
        player_control_system(&mut world, &held(&[KeyCode::KeyW, KeyCode::KeyS]), 0.016);
        assert_eq!(world.get::<Velocity>(e).0, Vec3::ZERO);
    }

    #[test]
    fn velocity_follows_facing() {
        let mut world = World::new();
        // Facing -X after a quarter turn to the left.
        let facing = Transform::IDENTITY.with_rotation(Quat::from_rotation_y(FRAC_PI_2));
        let e = spawn_player(&mut world, facing);
        player_control_system(&mut world, &held(&[KeyCode::KeyW]), 0.016);
        assert!(approx(world.get::<Velocity>(e).0, Vec3::new(-2.0, 0.0, 0.0)));
    }

    #[test]
    fn mouse_look_requires_toggle() {
        let mut world = World::new();
        let e = spawn_player(&mut world, Transform::IDENTITY);
        let mut input = InputState::new();
        input.handle_mouse_motion(Vec2::new(100.0, 0.0));

        player_control_system(&mut world, &input, 0.016);
        assert_eq!(world.get::<Transform>(e).rotation, Quat::IDENTITY);

        input.handle_mouse_button(1, true);
        player_control_system(&mut world, &input, 0.016);
        let forward = world.get::<Transform>(e).forward();
        // Moving the mouse right yaws clockwise seen from above.
        let expected = Quat::from_rotation_y(-1.0) * Vec3::NEG_Z;
        assert!(approx(forward, expected));
    }

    #[test]
    fn pitch_is_applied_about_local_x() {
        let mut world = World::new();
        let yawed = Transform::IDENTITY.with_rotation(Quat::from_rotation_y(FRAC_PI_2));
        let e = spawn_player(&mut world, yawed);
        let mut input = InputState::new();
        input.handle_mouse_button(1, true);
        input.handle_mouse_motion(Vec2::new(0.0, -50.0));

        player_control_system(&mut world, &input, 0.016);
        let t = world.get::<Transform>(e);
        // Pitch keeps the right vector and tilts forward upward.
        assert!(approx(t.right(), Vec3::new(0.0, 0.0, -1.0)));
        assert!(t.forward().y > 0.4);
    }

    #[test]
    fn entities_without_velocity_are_not_driven() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add(e, PlayerInputController::default());
        world.add(e, Transform::IDENTITY);
        assert_eq!(player_control_system(&mut world, &held(&[KeyCode::KeyW]), 0.016), 0);
    }
}
