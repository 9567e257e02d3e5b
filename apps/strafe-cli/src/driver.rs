use glam::Vec3;
use strafe_common::Transform;
use strafe_ecs::{Entity, World};
use strafe_input::{InputState, PlayerInputController, player_control_system};
use strafe_physics::{CylinderCollider, IntegrationReport, Velocity, integration_system};
use strafe_scene::{Hierarchy, Name};

use crate::config::SimConfig;

/// What one [`FrameDriver::step`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub driven: usize,
    pub integration: IntegrationReport,
    pub freed: usize,
}

/// Owns the world and runs the per-frame system order:
/// control, integration, then flush of deferred destruction.
#[derive(Debug)]
pub struct FrameDriver {
    world: World,
    config: SimConfig,
    input: InputState,
    frame: u64,
}

impl FrameDriver {
    pub fn new(world: World, config: SimConfig) -> Self {
        Self {
            world,
            config,
            input: InputState::new(),
            frame: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Spawn a player-controlled cylinder at `position`.
    pub fn spawn_player(&mut self, position: Vec3) -> Entity {
        let world = &mut self.world;
        let e = world.create_entity();
        world.add(e, Name::new("player"));
        world.add(e, Hierarchy::default());
        world.add(e, Transform::from_position(position));
        world.add(e, Velocity::default());
        world.add(
            e,
            CylinderCollider {
                radius: 0.4,
                height: 1.8,
            },
        );
        world.add(e, PlayerInputController::new(self.config.control.clone()));
        tracing::debug!(entity = %e, %position, "player spawned");
        e
    }

    pub fn step(&mut self, dt: f32) -> FrameStats {
        let _span = tracing::info_span!("frame", frame = self.frame).entered();

        let driven = player_control_system(&mut self.world, &self.input, dt);
        let integration = integration_system(&mut self.world, &self.config.physics, dt);
        let freed = self.world.flush();
        self.input.end_frame();

        let stats = FrameStats {
            frame: self.frame,
            driven,
            integration,
            freed,
        };
        self.frame += 1;
        stats
    }
}
