/// Errors from loading or importing a scene.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("node {node} lists child {child}, but the scene has {len} nodes")]
    ChildOutOfRange { node: usize, child: usize, len: usize },
    #[error("mesh {mesh} references material {material}, but the scene has {len} materials")]
    MaterialOutOfRange { mesh: usize, material: u32, len: usize },
    #[error("node {node} references mesh {mesh}, but the scene has {len} meshes")]
    MeshOutOfRange { node: usize, mesh: u32, len: usize },
    #[error("node {child} has more than one parent ({first} and {second})")]
    MultipleParents {
        child: usize,
        first: usize,
        second: usize,
    },
    #[error("node {node} is part of a parent cycle")]
    Cycle { node: usize },
    #[error("node {node} sets both a matrix and translation/rotation/scale")]
    ConflictingTransform { node: usize },
    #[error("node {node} has a collider but is not a root node")]
    NestedCollider { node: usize },
}
