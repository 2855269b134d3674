//! Triangle assembly.
//!
//! Turns a decoded geometry into render-ready groups: one group per
//! material split, with every triangle corner given its own vertex slot.
//! Vertices are duplicated per corner, never shared, so per-vertex data can
//! be copied straight into flat attribute buffers.
//!
//! Splits come from, in order of preference:
//!
//! 1. a BinMesh plugin whose splits embed vertex indices (lists or strips);
//! 2. a count-only BinMesh, partitioning the raw triangle list into runs;
//! 3. the raw triangles' material ids, in first-occurrence order.

use crate::error::AssemblyError;
use crate::geometry::{Geometry, Triangle};
use crate::plugins::{BinMesh, FaceType, Skin};

/// A contiguous range of output vertices drawn with one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderGroup {
    pub material_index: u32,
    /// First output vertex slot.
    pub start: usize,
    /// Number of output vertex slots (three per triangle).
    pub count: usize,
    /// Source vertex indices, three per triangle.
    pub triangles: Vec<[u32; 3]>,
}

/// Flattened, material-grouped vertex data.
#[derive(Debug, Clone, Default)]
pub struct AssembledMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uv_sets: Vec<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[u8; 4]>>,
    pub groups: Vec<RenderGroup>,
    /// For each source vertex, the output slots it was copied to.
    pub vertex_map: Vec<Vec<u32>>,
}

/// Bone influences laid out per output slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinAttributes {
    pub indices: Vec<[u8; 4]>,
    pub weights: Vec<[f32; 4]>,
}

impl AssembledMesh {
    /// Number of output vertex slots.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.triangles.len()).sum()
    }

    /// Scatter a skin's per-vertex influences onto the output slots.
    ///
    /// Slots whose source vertex has no influence entry stay zeroed.
    pub fn skin_attributes(&self, skin: &Skin) -> SkinAttributes {
        let slots = self.vertex_count();
        let mut indices = vec![[0u8; 4]; slots];
        let mut weights = vec![[0.0f32; 4]; slots];

        for (source, targets) in self.vertex_map.iter().enumerate() {
            let (Some(bones), Some(bone_weights)) =
                (skin.bone_indices.get(source), skin.bone_weights.get(source))
            else {
                continue;
            };
            for &slot in targets {
                indices[slot as usize] = *bones;
                weights[slot as usize] = *bone_weights;
            }
        }

        SkinAttributes { indices, weights }
    }
}

/// Assemble a geometry into render groups.
pub fn assemble(geometry: &Geometry) -> Result<AssembledMesh, AssemblyError> {
    let splits = material_splits(geometry);

    let total: usize = splits.iter().map(|(_, t)| t.len()).sum();
    let positions = match geometry.positions() {
        Some(positions) => positions,
        None if total == 0 => &[],
        None => return Err(AssemblyError::MissingPositions),
    };
    let normals = geometry.normals();
    let colors = geometry.colors.as_deref();

    // Every per-vertex array is sized to the vertex count when decoded; the
    // shortest one bounds the valid indices regardless.
    let vertex_count = std::iter::once(geometry.vertex_count as usize)
        .chain(std::iter::once(positions.len()))
        .chain(normals.map(<[_]>::len))
        .chain(colors.map(<[_]>::len))
        .chain(geometry.uv_sets.iter().map(Vec::len))
        .min()
        .unwrap_or(0);

    for (_, triangles) in &splits {
        for &index in triangles.iter().flatten() {
            if index as usize >= vertex_count {
                return Err(AssemblyError::VertexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }
    }

    let slots = total * 3;
    let mut mesh = AssembledMesh {
        positions: Vec::with_capacity(slots),
        normals: normals.map(|_| Vec::with_capacity(slots)),
        uv_sets: geometry
            .uv_sets
            .iter()
            .map(|_| Vec::with_capacity(slots))
            .collect(),
        colors: colors.map(|_| Vec::with_capacity(slots)),
        groups: Vec::with_capacity(splits.len()),
        vertex_map: vec![Vec::new(); vertex_count],
    };

    for (material_index, triangles) in splits {
        let start = mesh.positions.len();
        for &index in triangles.iter().flatten() {
            let i = index as usize;
            let slot = mesh.positions.len() as u32;

            mesh.positions.push(positions[i]);
            if let (Some(out), Some(src)) = (mesh.normals.as_mut(), normals) {
                out.push(src[i]);
            }
            for (out, src) in mesh.uv_sets.iter_mut().zip(&geometry.uv_sets) {
                out.push(src[i]);
            }
            if let (Some(out), Some(src)) = (mesh.colors.as_mut(), colors) {
                out.push(src[i]);
            }
            mesh.vertex_map[i].push(slot);
        }

        mesh.groups.push(RenderGroup {
            material_index,
            start,
            count: mesh.positions.len() - start,
            triangles,
        });
    }

    Ok(mesh)
}

type Split = (u32, Vec<[u32; 3]>);

fn material_splits(geometry: &Geometry) -> Vec<Split> {
    let splits = match geometry.bin_mesh() {
        Some(mesh) if mesh.has_embedded_indices() => splits_from_indices(mesh),
        Some(mesh) => splits_from_counts(mesh, &geometry.triangles),
        None => Vec::new(),
    };

    if splits.is_empty() {
        splits_by_material_id(&geometry.triangles)
    } else {
        splits
    }
}

fn splits_from_indices(mesh: &BinMesh) -> Vec<Split> {
    let face_type = mesh.face_type();
    mesh.splits
        .iter()
        .filter_map(|split| {
            let indices = split.indices.as_deref().filter(|i| !i.is_empty())?;
            let triangles = match face_type {
                FaceType::List => indices
                    .chunks_exact(3)
                    .map(|t| [t[0], t[1], t[2]])
                    .collect(),
                FaceType::Strip => indices
                    .windows(3)
                    .enumerate()
                    .map(|(i, w)| {
                        if i % 2 == 0 {
                            [w[0], w[1], w[2]]
                        } else {
                            [w[1], w[0], w[2]]
                        }
                    })
                    .collect(),
            };
            Some((split.material_index, triangles))
        })
        .collect()
}

fn splits_from_counts(mesh: &BinMesh, triangles: &[Triangle]) -> Vec<Split> {
    let mut offset = 0usize;
    let mut splits = Vec::with_capacity(mesh.splits.len());

    for split in &mesh.splits {
        let wanted = split.index_count as usize / 3;
        let run: Vec<[u32; 3]> = triangles
            .iter()
            .skip(offset)
            .take(wanted)
            .map(Triangle::vertices)
            .collect();
        offset = offset.saturating_add(wanted);

        if !run.is_empty() {
            splits.push((split.material_index, run));
        }
    }

    splits
}

fn splits_by_material_id(triangles: &[Triangle]) -> Vec<Split> {
    let mut splits: Vec<Split> = Vec::new();
    for triangle in triangles {
        let material = u32::from(triangle.material_id);
        match splits.iter_mut().find(|(m, _)| *m == material) {
            Some((_, group)) => group.push(triangle.vertices()),
            None => splits.push((material, vec![triangle.vertices()])),
        }
    }
    splits
}
