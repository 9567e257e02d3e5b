use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use strafe_common::Transform;

use crate::AssetError;

/// A scene file: material and mesh tables plus a flat node list linked by
/// child indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDescription {
    #[serde(default)]
    pub materials: Vec<MaterialDescription>,
    #[serde(default)]
    pub meshes: Vec<MeshDescription>,
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    /// Where a player should start, if the scene says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_spawn: Option<[f32; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDescription {
    pub name: String,
    #[serde(default)]
    pub vertex_count: u32,
    #[serde(default)]
    pub index_count: u32,
    /// Index into the material table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescription {
    pub name: String,
    #[serde(default = "default_base_color")]
    pub base_color: [f32; 4],
}

fn default_base_color() -> [f32; 4] {
    [0.8, 0.8, 0.8, 1.0]
}

impl Default for MaterialDescription {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: default_base_color(),
        }
    }
}

/// One node. The local transform is either `matrix` (16 floats, column
/// major) or any of `translation`/`rotation` (xyzw)/`scale`, never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f32; 16]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collider: Option<ColliderDescription>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColliderDescription {
    Box { half_extents: [f32; 3] },
    Cylinder { radius: f32, height: f32 },
}

impl NodeDescription {
    pub fn has_trs(&self) -> bool {
        self.translation.is_some() || self.rotation.is_some() || self.scale.is_some()
    }

    /// Local transform; a matrix is decomposed into scale/rotation/translation.
    pub fn local_transform(&self) -> Transform {
        if let Some(m) = self.matrix {
            return Transform::from_matrix(Mat4::from_cols_array(&m));
        }
        Transform {
            position: self.translation.map_or(Vec3::ZERO, Vec3::from_array),
            rotation: self
                .rotation
                .map_or(Quat::IDENTITY, |q| Quat::from_array(q).normalize()),
            scale: self.scale.map_or(Vec3::ONE, Vec3::from_array),
        }
    }
}

impl SceneDescription {
    pub fn from_json_str(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Check material, child and mesh indices, single parenthood and acyclicity.
    /// Returns each node's parent index.
    pub fn validate(&self) -> Result<Vec<Option<usize>>, AssetError> {
        for (mesh, desc) in self.meshes.iter().enumerate() {
            if let Some(material) = desc.material {
                if material as usize >= self.materials.len() {
                    return Err(AssetError::MaterialOutOfRange {
                        mesh,
                        material,
                        len: self.materials.len(),
                    });
                }
            }
        }

        let len = self.nodes.len();
        let mut parents: Vec<Option<usize>> = vec![None; len];

        for (node, desc) in self.nodes.iter().enumerate() {
            if desc.matrix.is_some() && desc.has_trs() {
                return Err(AssetError::ConflictingTransform { node });
            }
            if let Some(mesh) = desc.mesh {
                if mesh as usize >= self.meshes.len() {
                    return Err(AssetError::MeshOutOfRange {
                        node,
                        mesh,
                        len: self.meshes.len(),
                    });
                }
            }
            for &child in &desc.children {
                if child >= len {
                    return Err(AssetError::ChildOutOfRange { node, child, len });
                }
                if let Some(first) = parents[child] {
                    return Err(AssetError::MultipleParents {
                        child,
                        first,
                        second: node,
                    });
                }
                parents[child] = Some(node);
            }
        }

        // With single parents, a node is acyclic iff walking up reaches a
        // root within `len` steps.
        for start in 0..len {
            let mut current = start;
            let mut steps = 0;
            while let Some(parent) = parents[current] {
                if parent == start || steps > len {
                    return Err(AssetError::Cycle { node: start });
                }
                current = parent;
                steps += 1;
            }
        }

        for (node, desc) in self.nodes.iter().enumerate() {
            if desc.collider.is_some() && parents[node].is_some() {
                return Err(AssetError::NestedCollider { node });
            }
        }

        Ok(parents)
    }
}
