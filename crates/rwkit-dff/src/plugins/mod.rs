//! Plugin payloads carried in Extension chunks.

mod bin_mesh;
mod hanim;
mod skin;

pub use bin_mesh::{BinMesh, FaceType, MeshSplit};
pub use hanim::{HAnim, HAnimHierarchy, HAnimNode};
pub use skin::Skin;

/// Rockstar mesh extension.
///
/// Only the empty form (magic 0) is understood; anything else is kept as
/// its magic number and the body is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshExtension {
    pub magic: u32,
}

impl MeshExtension {
    pub fn is_empty(&self) -> bool {
        self.magic == 0
    }
}
