//! Synthetic DFF streams for unit tests.

use rwkit_common::testing::{ChunkWriter, BUILD_3_6};
use rwkit_common::ChunkType;

use crate::extension::{Extension, Plugin};
use crate::geometry::{BoundingSphere, Geometry, GeometryFormat, MorphTarget, Triangle};
use crate::material::MaterialList;

pub(crate) const IDENTITY: [f32; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// A frame record with identity rotation.
pub(crate) fn frame_record(w: &mut ChunkWriter, position: [f32; 3], parent: i32) {
    w.f32s(&IDENTITY).f32s(&position).i32(parent).u32(0);
}

/// Write a FrameList whose frames carry the given parents and HAnim node
/// ids; `hierarchy` attaches a node list to the frame at its index.
pub(crate) fn frame_list(
    w: &mut ChunkWriter,
    parents: &[i32],
    node_ids: &[Option<u32>],
    hierarchy: Option<(usize, &[u32])>,
) {
    w.chunk(ChunkType::FrameList, BUILD_3_6, |w| {
        w.struct_chunk(|w| {
            w.u32(parents.len() as u32);
            for &parent in parents {
                frame_record(w, [0.0; 3], parent);
            }
        });
        for index in 0..parents.len() {
            let node_id = node_ids.get(index).copied().flatten();
            w.chunk(ChunkType::Extension, BUILD_3_6, |w| {
                let Some(node_id) = node_id else { return };
                w.chunk(ChunkType::HAnim, BUILD_3_6, |w| {
                    w.u32(0x100).u32(node_id);
                    match hierarchy {
                        Some((at, ids)) if at == index => {
                            w.u32(ids.len() as u32).u32(0).u32(36);
                            for (i, id) in ids.iter().enumerate() {
                                w.u32(*id).u32(i as u32).u32(0);
                            }
                        }
                        _ => {
                            w.u32(0);
                        }
                    }
                });
            });
        }
    });
}

/// Write a Material chunk, optionally textured with `(name, mask)`.
pub(crate) fn material(w: &mut ChunkWriter, color: [u8; 4], texture: Option<(&str, &str)>) {
    w.chunk(ChunkType::Material, BUILD_3_6, |w| {
        w.struct_chunk(|w| {
            w.u32(0)
                .bytes(&color)
                .u32(0)
                .u32(texture.is_some() as u32)
                .f32s(&[1.0, 1.0, 1.0]);
        });
        if let Some((name, mask)) = texture {
            w.chunk(ChunkType::Texture, BUILD_3_6, |w| {
                w.struct_chunk(|w| {
                    w.u16(0x1106).u16(0);
                });
                w.chunk(ChunkType::String, BUILD_3_6, |w| {
                    w.fixed_str(name, name.len() + 1);
                });
                w.chunk(ChunkType::String, BUILD_3_6, |w| {
                    if !mask.is_empty() {
                        w.fixed_str(mask, mask.len() + 1);
                    }
                });
                w.empty_extension();
            });
        }
        w.empty_extension();
    });
}

/// Raw arrays for a synthetic geometry.
#[derive(Debug, Clone, Default)]
pub(crate) struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub colors: Option<Vec<[u8; 4]>>,
    pub uv_sets: Vec<Vec<[f32; 2]>>,
    /// Triangles in stream order: (vertexB, vertexA, materialId, vertexC).
    pub triangles: Vec<[u16; 4]>,
    pub material_count: usize,
}

impl MeshData {
    /// `count` vertices along the x axis, all with prelit colors.
    pub(crate) fn line(count: usize) -> Self {
        Self {
            positions: (0..count).map(|i| [i as f32, 0.0, 0.0]).collect(),
            normals: Some(vec![[0.0, 0.0, 1.0]; count]),
            colors: Some((0..count).map(|i| [i as u8, 0, 0, 255]).collect()),
            uv_sets: vec![(0..count).map(|i| [i as f32, 1.0]).collect()],
            triangles: Vec::new(),
            material_count: 1,
        }
    }

    pub(crate) fn format(&self) -> u32 {
        let mut format = GeometryFormat::POSITIONS;
        if self.normals.is_some() {
            format |= GeometryFormat::NORMALS;
        }
        if self.colors.is_some() {
            format |= GeometryFormat::PRELIT;
        }
        match self.uv_sets.len() {
            0 => {}
            1 => format |= GeometryFormat::TEXTURED,
            n => format |= GeometryFormat::TEXTURED2 | ((n as u32) << 16),
        }
        format
    }

    /// Build the decoded form directly, with `plugins` in its extension.
    pub(crate) fn to_geometry(&self, plugins: Vec<Plugin>) -> Geometry {
        let mut extension = Extension::default();
        for plugin in plugins {
            extension.insert(plugin);
        }
        Geometry {
            offset: 0,
            format: GeometryFormat(self.format()),
            triangle_count: self.triangles.len() as u32,
            vertex_count: self.positions.len() as u32,
            morph_target_count: 1,
            surface: None,
            colors: self.colors.clone(),
            uv_sets: self.uv_sets.clone(),
            triangles: self
                .triangles
                .iter()
                .map(|t| Triangle {
                    vertex_b: t[0],
                    vertex_a: t[1],
                    material_id: t[2],
                    vertex_c: t[3],
                })
                .collect(),
            morph_targets: vec![MorphTarget {
                bounding_sphere: BoundingSphere {
                    center: [0.0; 3],
                    radius: 1.0,
                },
                positions: Some(self.positions.clone()),
                normals: self.normals.clone(),
            }],
            materials: MaterialList::default(),
            extension,
        }
    }
}

/// Write a Geometry chunk; `plugins` fills its trailing Extension.
pub(crate) fn geometry(w: &mut ChunkWriter, mesh: &MeshData, plugins: impl FnOnce(&mut ChunkWriter)) {
    let vertex_count = mesh.positions.len();
    w.chunk(ChunkType::Geometry, BUILD_3_6, |w| {
        w.struct_chunk(|w| {
            w.u32(mesh.format())
                .u32(mesh.triangles.len() as u32)
                .u32(vertex_count as u32)
                .u32(1);
            if let Some(colors) = &mesh.colors {
                for color in colors {
                    w.bytes(color);
                }
            }
            for set in &mesh.uv_sets {
                for uv in set {
                    w.f32s(uv);
                }
            }
            for triangle in &mesh.triangles {
                for &index in triangle {
                    w.u16(index);
                }
            }
            w.f32s(&[0.0, 0.0, 0.0, 10.0]);
            w.u32(1).u32(mesh.normals.is_some() as u32);
            for position in &mesh.positions {
                w.f32s(position);
            }
            if let Some(normals) = &mesh.normals {
                for normal in normals {
                    w.f32s(normal);
                }
            }
        });
        w.chunk(ChunkType::MaterialList, BUILD_3_6, |w| {
            w.struct_chunk(|w| {
                w.u32(mesh.material_count as u32);
                for _ in 0..mesh.material_count {
                    w.u32(0xFFFF_FFFF);
                }
            });
            for i in 0..mesh.material_count {
                material(w, [i as u8, 0, 0, 255], None);
            }
        });
        w.chunk(ChunkType::Extension, BUILD_3_6, plugins);
    });
}

/// Write a count-only or index-carrying BinMesh plugin.
pub(crate) fn bin_mesh(w: &mut ChunkWriter, strip: bool, splits: &[(u32, u32, Option<&[u32]>)]) {
    w.chunk(ChunkType::BinMesh, BUILD_3_6, |w| {
        let total: u32 = splits.iter().map(|s| s.1).sum();
        w.u32(strip as u32).u32(splits.len() as u32).u32(total);
        for &(material, count, indices) in splits {
            w.u32(count).u32(material);
            if let Some(indices) = indices {
                for &index in indices {
                    w.u32(index);
                }
            }
        }
    });
}

/// Write a Skin plugin with one bone per vertex and identity matrices.
pub(crate) fn skin(w: &mut ChunkWriter, vertex_count: usize, bone_count: u8) {
    w.chunk(ChunkType::Skin, BUILD_3_6, |w| {
        w.u8(bone_count).u8(0).u8(1).u8(0);
        for i in 0..vertex_count {
            w.bytes(&[(i % bone_count.max(1) as usize) as u8, 0, 0, 0]);
        }
        for _ in 0..vertex_count {
            w.f32s(&[1.0, 0.0, 0.0, 0.0]);
        }
        for _ in 0..bone_count {
            w.u32(0xDEAD_DEAD);
            w.f32s(&[
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ]);
        }
    });
}

/// Write a whole Clump with one atomic per geometry, each bound to frame 0.
pub(crate) fn clump(
    w: &mut ChunkWriter,
    frames: impl FnOnce(&mut ChunkWriter),
    geometries: impl FnOnce(&mut ChunkWriter) -> usize,
) {
    w.chunk(ChunkType::Clump, BUILD_3_6, |w| {
        let mut body = ChunkWriter::new();
        frames(&mut body);
        let mut list = ChunkWriter::new();
        let count = geometries(&mut list);
        let list = list.finish();

        w.struct_chunk(|w| {
            w.u32(count as u32).u32(0).u32(0);
        });
        w.bytes(&body.finish());
        w.chunk(ChunkType::GeometryList, BUILD_3_6, |w| {
            w.struct_chunk(|w| {
                w.u32(count as u32);
            });
            w.bytes(&list);
        });
        for index in 0..count {
            atomic(w, 0, index as u32);
        }
        w.empty_extension();
    });
}

pub(crate) fn atomic(w: &mut ChunkWriter, frame: u32, geometry: u32) {
    w.chunk(ChunkType::Atomic, BUILD_3_6, |w| {
        w.struct_chunk(|w| {
            w.u32(frame).u32(geometry).u32(5).u32(0);
        });
        w.empty_extension();
    });
}
