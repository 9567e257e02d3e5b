use glam::Vec3;
use strafe_ecs::{Entity, World};
use strafe_physics::{BoxCollider, CylinderCollider};
use strafe_scene::{Hierarchy, MeshRef, Name, set_parent};

use crate::{AssetError, ColliderDescription, SceneDescription};

/// Entities created by one import, indexed like the description's nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedScene {
    pub entities: Vec<Entity>,
    pub roots: Vec<Entity>,
}

/// Turns a [`SceneDescription`] into entities: one per node, each with a
/// `Hierarchy` and `Transform`, plus `Name`, `MeshRef` and a collider when
/// the node has them. Children keep their listed order.
///
/// Only box colliders block movement. A `cylinder` collider on a scene node
/// is visible to ray casts but never pushes anything out.
#[derive(Debug, Default)]
pub struct SceneImporter;

impl SceneImporter {
    pub fn new() -> Self {
        Self
    }

    /// Validate, then spawn. Nothing is created if validation fails.
    pub fn import(
        &self,
        world: &mut World,
        scene: &SceneDescription,
    ) -> Result<ImportedScene, AssetError> {
        let _span = tracing::info_span!("scene_import", nodes = scene.nodes.len()).entered();
        let parents = scene.validate()?;

        let entities: Vec<Entity> = scene
            .nodes
            .iter()
            .map(|node| {
                let e = world.create_entity();
                world.add(e, Hierarchy::default());
                world.add(e, node.local_transform());
                if let Some(name) = &node.name {
                    world.add(e, Name::new(name.as_str()));
                }
                if let Some(mesh) = node.mesh {
                    world.add(e, MeshRef(mesh));
                }
                match node.collider {
                    Some(ColliderDescription::Box { half_extents }) => {
                        world.add(
                            e,
                            BoxCollider {
                                half_extents: Vec3::from_array(half_extents),
                            },
                        );
                    }
                    Some(ColliderDescription::Cylinder { radius, height }) => {
                        world.add(e, CylinderCollider { radius, height });
                    }
                    None => {}
                }
                e
            })
            .collect();

        for (node, desc) in scene.nodes.iter().enumerate() {
            for &child in &desc.children {
                set_parent(world, entities[child], entities[node]);
            }
        }

        let roots = entities
            .iter()
            .zip(&parents)
            .filter(|(_, parent)| parent.is_none())
            .map(|(e, _)| *e)
            .collect();

        tracing::debug!(entities = entities.len(), "scene imported");
        Ok(ImportedScene { entities, roots })
    }
}
