//! BinMesh plugin: per-material triangle splits.

use rwkit_common::{BinaryReader, ChunkHeader};

use crate::Result;

/// How a split's indices form triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceType {
    /// Every three indices form one triangle.
    List,
    /// A sliding window of three indices with alternating winding.
    Strip,
}

/// One material split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshSplit {
    pub material_index: u32,
    /// Number of indices in the split (triangle count x 3 for lists).
    pub index_count: u32,
    /// Absolute vertex indices, when the file embeds them.
    pub indices: Option<Vec<u32>>,
}

/// BinMesh plugin payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinMesh {
    /// Raw flags word; bit 0 selects strips.
    pub flags: u32,
    /// Total index count over all splits.
    pub index_count: u32,
    pub splits: Vec<MeshSplit>,
}

impl BinMesh {
    pub(crate) fn read(reader: &mut BinaryReader<'_>, header: &ChunkHeader) -> Result<Self> {
        let flags = reader.read_u32()?;
        let split_count = reader.read_u32()? as usize;
        let index_count = reader.read_u32()?;

        // Count-only meshes are exactly 12 + 8 per split; anything longer
        // carries the index arrays inline.
        let has_indices = header.length as u64 > 12 + split_count as u64 * 8;

        let mut splits = Vec::with_capacity(reader.capacity_for(split_count, 8));
        for _ in 0..split_count {
            let split_indices = reader.read_u32()?;
            let material_index = reader.read_u32()?;

            let indices = if has_indices {
                let count = split_indices as usize;
                let mut indices = Vec::with_capacity(reader.capacity_for(count, 4));
                for _ in 0..count {
                    indices.push(reader.read_u32()?);
                }
                Some(indices)
            } else {
                None
            };

            splits.push(MeshSplit {
                material_index,
                index_count: split_indices,
                indices,
            });
        }

        Ok(Self {
            flags,
            index_count,
            splits,
        })
    }

    pub fn face_type(&self) -> FaceType {
        if self.flags & 1 != 0 {
            FaceType::Strip
        } else {
            FaceType::List
        }
    }

    /// Whether any split carries an embedded index array.
    pub fn has_embedded_indices(&self) -> bool {
        self.splits
            .iter()
            .any(|s| s.indices.as_ref().is_some_and(|i| !i.is_empty()))
    }
}
