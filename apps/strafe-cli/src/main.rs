mod config;
mod driver;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use strafe_assets::{ColliderDescription, NodeDescription, SceneDescription, SceneImporter};
use strafe_common::Transform;
use strafe_ecs::World;
use strafe_input::{BinaryBinding, ControlBindings};
use strafe_physics::{PhysicsError, cast_ray};
use strafe_render::{DebugTextRenderer, RenderView, Renderer};
use tracing_subscriber::EnvFilter;

use config::SimConfig;
use driver::FrameDriver;

#[derive(Parser)]
#[command(name = "strafe-cli", about = "Headless driver for the strafe simulation core")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Import a scene, spawn a player and step the frame loop
    Simulate {
        /// Scene description (JSON); a built-in test room when omitted
        #[arg(short, long)]
        scene: Option<PathBuf>,
        /// Simulation config (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// Actions held down for the whole run
        #[arg(long, value_enum)]
        hold: Vec<HeldAction>,
        /// Print the debug frame after the run
        #[arg(long)]
        render: bool,
    },
    /// Cast a ray into a scene and report the nearest hit
    Raycast {
        /// Scene description (JSON); a built-in test room when omitted
        #[arg(short, long)]
        scene: Option<PathBuf>,
        /// Ray origin
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true, default_values_t = [0.0, 1.0, 0.0])]
        origin: Vec<f32>,
        /// Ray direction; need not be normalised
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true, default_values_t = [0.0, 0.0, -1.0])]
        direction: Vec<f32>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeldAction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    Fast,
}

impl HeldAction {
    fn binding(self, bindings: &ControlBindings) -> BinaryBinding {
        match self {
            Self::Forward => bindings.forward,
            Self::Back => bindings.back,
            Self::Left => bindings.left,
            Self::Right => bindings.right,
            Self::Up => bindings.up,
            Self::Down => bindings.down,
            Self::Fast => bindings.fast,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("strafe-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", strafe_common::crate_info());
            println!("ecs: {}", strafe_ecs::crate_info());
            println!("scene: {}", strafe_scene::crate_info());
            println!("physics: {}", strafe_physics::crate_info());
            println!("input: {}", strafe_input::crate_info());
            println!("render: {}", strafe_render::crate_info());
            println!("assets: {}", strafe_assets::crate_info());
        }
        Commands::Simulate {
            scene,
            config,
            frames,
            dt,
            hold,
            render,
        } => {
            let config = match config {
                Some(path) => SimConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => SimConfig::default(),
            };
            let scene = load_scene(scene)?;
            let mut world = World::new();
            SceneImporter::new().import(&mut world, &scene)?;

            let spawn = scene.player_spawn.map_or(Vec3::new(0.0, 0.9, 0.0), Vec3::from_array);
            let bindings = config.control.bindings.clone();
            let mut driver = FrameDriver::new(world, config);
            let player = driver.spawn_player(spawn);
            for action in &hold {
                match action.binding(&bindings) {
                    BinaryBinding::Key(key) => driver.input_mut().handle_key(key, true),
                    BinaryBinding::MouseButton(b) => driver.input_mut().handle_mouse_button(b, true),
                }
            }

            println!("Simulating {frames} frames at dt={dt:.4}, holding {hold:?}");
            let mut unresolved = 0;
            for _ in 0..frames {
                let stats = driver.step(dt);
                unresolved += stats.integration.unresolved.len();
            }

            let t = driver.world().get::<Transform>(player);
            println!(
                "Player: pos=({:.3}, {:.3}, {:.3}) frames={} unresolved={}",
                t.position.x,
                t.position.y,
                t.position.z,
                driver.frame(),
                unresolved
            );
            if render {
                let view = RenderView::from_transform(t);
                print!("{}", DebugTextRenderer::new().render(driver.world(), &view));
            }
        }
        Commands::Raycast {
            scene,
            origin,
            direction,
        } => {
            let scene = load_scene(scene)?;
            let mut world = World::new();
            SceneImporter::new().import(&mut world, &scene)?;

            let origin = vec3(&origin)?;
            let direction = vec3(&direction)?;
            match cast_ray(&world, origin, direction) {
                Ok(Some(hit)) => {
                    let name = world
                        .try_get::<strafe_scene::Name>(hit.entity)
                        .map_or("-", |n| n.as_str());
                    println!(
                        "Hit {} ({}) t={:.3} point=({:.3}, {:.3}, {:.3}) normal=({:.2}, {:.2}, {:.2})",
                        hit.entity,
                        name,
                        hit.t,
                        hit.point.x,
                        hit.point.y,
                        hit.point.z,
                        hit.normal.x,
                        hit.normal.y,
                        hit.normal.z
                    );
                }
                Ok(None) => println!("No hit"),
                Err(err @ PhysicsError::InvalidRay { .. }) => {
                    tracing::warn!(%err, "ray rejected");
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}

fn vec3(values: &[f32]) -> anyhow::Result<Vec3> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => anyhow::bail!("expected 3 components, got {}", values.len()),
    }
}

fn load_scene(path: Option<PathBuf>) -> anyhow::Result<SceneDescription> {
    match path {
        Some(path) => SceneDescription::load(&path)
            .with_context(|| format!("loading scene {}", path.display())),
        None => Ok(test_room()),
    }
}

/// A floor with one wall ahead of the origin.
fn test_room() -> SceneDescription {
    let slab = |name: &str, translation: [f32; 3], half_extents: [f32; 3]| NodeDescription {
        name: Some(name.into()),
        translation: Some(translation),
        collider: Some(ColliderDescription::Box { half_extents }),
        ..NodeDescription::default()
    };
    SceneDescription {
        materials: Vec::new(),
        meshes: Vec::new(),
        nodes: vec![
            slab("floor", [0.0, -1.0, 0.0], [20.0, 1.0, 20.0]),
            slab("wall", [0.0, 2.0, -5.0], [20.0, 2.0, 0.5]),
        ],
        player_spawn: Some([0.0, 0.9, 0.0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_room_imports() {
        let mut world = World::new();
        let imported = SceneImporter::new().import(&mut world, &test_room()).unwrap();
        assert_eq!(imported.roots.len(), 2);
    }

    #[test]
    fn demo_files_load() {
        let scene =
            SceneDescription::from_json_str(include_str!("../../../demos/test_room.json")).unwrap();
        let mut world = World::new();
        let imported = SceneImporter::new().import(&mut world, &scene).unwrap();
        assert_eq!(imported.entities.len(), 5);

        let config = SimConfig::from_yaml_str(include_str!("../../../demos/sim.yaml")).unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn demo_pillar_blocks_the_player() {
        let scene =
            SceneDescription::from_json_str(include_str!("../../../demos/test_room.json")).unwrap();
        let mut world = World::new();
        let imported = SceneImporter::new().import(&mut world, &scene).unwrap();
        let pillar = imported.entities[3];
        assert_eq!(world.get::<strafe_scene::Name>(pillar).as_str(), "pillar");
        assert!(world.has::<strafe_physics::BoxCollider>(pillar));

        let player = world.create_entity();
        let hit = strafe_physics::find_first_collision(
            &world,
            player,
            &Transform::from_xyz(-3.0, 0.9, -3.0),
            &strafe_physics::CylinderCollider {
                radius: 0.4,
                height: 1.8,
            },
        )
        .unwrap();
        assert!((hit.normal - Vec3::Z).length() < 1e-4);
        assert!((hit.penetration_depth - 0.15).abs() < 1e-4);
    }

    #[test]
    fn ray_from_spawn_hits_the_wall() {
        let mut world = World::new();
        SceneImporter::new().import(&mut world, &test_room()).unwrap();
        let hit = cast_ray(&world, Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z)
            .unwrap()
            .unwrap();
        assert!((hit.t - 4.5).abs() < 1e-4);
        assert_eq!(world.get::<strafe_scene::Name>(hit.entity).as_str(), "wall");
    }

    #[test]
    fn vec3_needs_three_components() {
        assert_eq!(vec3(&[1.0, 2.0, 3.0]).unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(vec3(&[1.0]).is_err());
    }

    #[test]
    fn cli_parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "strafe-cli", "simulate", "--frames", "10", "--hold", "forward", "--hold", "fast",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { frames, hold, .. } => {
                assert_eq!(frames, 10);
                assert_eq!(hold.len(), 2);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn cli_parses_negative_ray_components() {
        let cli = Cli::try_parse_from([
            "strafe-cli", "raycast", "--origin", "0", "1", "0", "--direction", "0", "-1", "-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Raycast { direction, .. } => assert_eq!(direction, vec![0.0, -1.0, -1.0]),
            _ => panic!("expected raycast"),
        }
    }
}
