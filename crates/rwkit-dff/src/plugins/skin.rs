//! Skin plugin: per-vertex bone influences and inverse bind matrices.

use rwkit_common::BinaryReader;

use crate::Result;

/// Skin plugin payload.
///
/// The per-vertex arrays are parallel and sized to the owning geometry's
/// vertex count.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    pub bone_count: u8,
    pub used_bones: Vec<u8>,
    pub max_weights_per_vertex: u8,
    pub bone_indices: Vec<[u8; 4]>,
    pub bone_weights: Vec<[f32; 4]>,
    /// One column-major 4x4 matrix per bone.
    pub inverse_bind_matrices: Vec<[f32; 16]>,
}

impl Skin {
    pub(crate) fn read(reader: &mut BinaryReader<'_>, vertex_count: usize) -> Result<Self> {
        let bone_count = reader.read_u8()?;
        let used_count = reader.read_u8()?;
        let max_weights_per_vertex = reader.read_u8()?;
        let _padding = reader.read_u8()?;

        let used_bones = reader.read_bytes(used_count as usize)?.to_vec();

        let mut bone_indices = Vec::with_capacity(reader.capacity_for(vertex_count, 4));
        for _ in 0..vertex_count {
            bone_indices.push(reader.read_array::<4>()?);
        }

        let mut bone_weights = Vec::with_capacity(reader.capacity_for(vertex_count, 16));
        for _ in 0..vertex_count {
            bone_weights.push(reader.read_f32_array::<4>()?);
        }

        let mut inverse_bind_matrices = Vec::with_capacity(bone_count as usize);
        for _ in 0..bone_count {
            if used_count == 0 {
                // 0xDEADDEAD marker
                reader.skip(4)?;
            }
            inverse_bind_matrices.push(reader.read_f32_array::<16>()?);
        }

        if used_count != 0 {
            reader.skip(12)?;
        }

        Ok(Self {
            bone_count,
            used_bones,
            max_weights_per_vertex,
            bone_indices,
            bone_weights,
            inverse_bind_matrices,
        })
    }
}
