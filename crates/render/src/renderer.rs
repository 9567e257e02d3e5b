use std::fmt::Write;

use glam::{Mat4, Vec3};
use strafe_common::Transform;
use strafe_ecs::{Entity, World};
use strafe_scene::{Hierarchy, MeshRef, Name, world_matrix};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, 10.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

impl RenderView {
    /// First-person view from a camera transform.
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            eye: transform.position,
            target: transform.position + transform.forward(),
            ..Self::default()
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, 0.1, 1000.0)
    }
}

/// One mesh instance to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub entity: Entity,
    pub mesh: MeshRef,
    /// Local-to-world, including every ancestor's transform.
    pub model: Mat4,
}

/// Every live `{Hierarchy, Transform, MeshRef}` entity with its model matrix.
pub fn collect_draws(world: &World) -> Vec<DrawItem> {
    world
        .entities_with::<(&Hierarchy, &Transform, &MeshRef)>()
        .into_iter()
        .map(|entity| DrawItem {
            entity,
            mesh: *world.get::<MeshRef>(entity),
            model: world_matrix(world, entity),
        })
        .collect()
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads world state and a view configuration, then produces
/// output.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given world state and view.
    fn render(&self, world: &World, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable listing of what would be drawn.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, world: &World, view: &RenderView) -> String {
        let draws = collect_draws(world);
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame ===");
        let _ = writeln!(
            out,
            "Entities: {} Draws: {}",
            world.entity_count(),
            draws.len()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        );

        for draw in &draws {
            let p = draw.model.transform_point3(Vec3::ZERO);
            let name = world.try_get::<Name>(draw.entity).map_or("-", Name::as_str);
            let _ = writeln!(
                out,
                "  [{}] {} mesh={} pos=({:.2}, {:.2}, {:.2})",
                draw.entity, name, draw.mesh.0, p.x, p.y, p.z
            );
        }
        tracing::trace!(draws = draws.len(), "debug frame rendered");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strafe_scene::set_parent;

    fn spawn_mesh(world: &mut World, name: &str, position: Vec3, mesh: u32) -> Entity {
        let e = world.create_entity();
        world.add(e, Hierarchy::default());
        world.add(e, Transform::from_position(position));
        world.add(e, MeshRef(mesh));
        world.add(e, Name::new(name));
        e
    }

    #[test]
    fn debug_renderer_empty_world() {
        let world = World::new();
        let output = DebugTextRenderer::new().render(&world, &RenderView::default());
        assert!(output.contains("Entities: 0 Draws: 0"));
    }

    #[test]
    fn child_meshes_use_parent_transform() {
        let mut world = World::new();
        let parent = spawn_mesh(&mut world, "crate", Vec3::new(10.0, 0.0, 0.0), 0);
        let child = spawn_mesh(&mut world, "lid", Vec3::new(0.0, 1.0, 0.0), 1);
        set_parent(&mut world, child, parent);

        let draws = collect_draws(&world);
        assert_eq!(draws.len(), 2);
        let lid = draws.iter().find(|d| d.entity == child).unwrap();
        assert_eq!(lid.mesh, MeshRef(1));
        let p = lid.model.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(10.0, 1.0, 0.0)).length() < 1e-5);

        let output = DebugTextRenderer::new().render(&world, &RenderView::default());
        assert!(output.contains("lid mesh=1 pos=(10.00, 1.00, 0.00)"));
    }

    #[test]
    fn entities_without_mesh_or_pending_are_not_drawn() {
        let mut world = World::new();
        let bare = world.create_entity();
        world.add(bare, Transform::IDENTITY);
        world.add(bare, Hierarchy::default());
        let doomed = spawn_mesh(&mut world, "doomed", Vec3::ZERO, 2);
        world.destroy(doomed);

        assert!(collect_draws(&world).is_empty());
    }

    #[test]
    fn view_from_transform_looks_forward() {
        let view = RenderView::from_transform(&Transform::from_xyz(1.0, 2.0, 3.0));
        assert_eq!(view.eye, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(view.target, Vec3::new(1.0, 2.0, 2.0));
        let in_view = view.view_matrix().transform_point3(Vec3::new(1.0, 2.0, 0.0));
        assert!(in_view.z < 0.0);
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 60.0);
        assert_eq!(view.target, Vec3::ZERO);
    }
}
