//! Geometry chunks: vertex arrays, triangles and morph targets.

use rwkit_common::{
    read_chunk, BinaryReader, ChunkHeader, ChunkType, Diagnostic, DiagnosticKind, DiagnosticSink,
};

use crate::extension::{Extension, ExtensionOwner};
use crate::material::{MaterialList, SurfaceProperties};
use crate::plugins::{BinMesh, Skin};
use crate::Result;

/// Geometry format flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GeometryFormat(pub u32);

impl GeometryFormat {
    pub const TRISTRIP: u32 = 0x0000_0001;
    pub const POSITIONS: u32 = 0x0000_0002;
    pub const TEXTURED: u32 = 0x0000_0004;
    pub const PRELIT: u32 = 0x0000_0008;
    pub const NORMALS: u32 = 0x0000_0010;
    pub const LIGHT: u32 = 0x0000_0020;
    pub const MODULATE_MATERIAL_COLOR: u32 = 0x0000_0040;
    pub const TEXTURED2: u32 = 0x0000_0080;
    pub const NATIVE: u32 = 0x0100_0000;

    #[inline]
    pub const fn has(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub const fn is_native(self) -> bool {
        self.has(Self::NATIVE)
    }

    /// Number of UV sets: bits 16-23, or one when only the textured bit is set.
    pub const fn uv_set_count(self) -> usize {
        let count = ((self.0 >> 16) & 0xFF) as usize;
        if count == 0 && self.has(Self::TEXTURED) {
            1
        } else {
            count
        }
    }
}

/// A raw triangle in stream field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub vertex_b: u16,
    pub vertex_a: u16,
    pub material_id: u16,
    pub vertex_c: u16,
}

impl Triangle {
    /// Corner indices in winding order (A, B, C).
    #[inline]
    pub fn vertices(&self) -> [u32; 3] {
        [
            u32::from(self.vertex_a),
            u32::from(self.vertex_b),
            u32::from(self.vertex_c),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: [f32; 3],
    pub radius: f32,
}

/// One morph target. Only the first is used for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphTarget {
    pub bounding_sphere: BoundingSphere,
    pub positions: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
}

#[derive(Debug, Clone)]
pub struct Geometry {
    /// Byte offset of the Geometry chunk header.
    pub offset: usize,
    pub format: GeometryFormat,
    pub triangle_count: u32,
    pub vertex_count: u32,
    pub morph_target_count: u32,
    /// Pre-3.4 lighting coefficients.
    pub surface: Option<SurfaceProperties>,
    /// Prelit vertex colors, RGBA.
    pub colors: Option<Vec<[u8; 4]>>,
    pub uv_sets: Vec<Vec<[f32; 2]>>,
    pub triangles: Vec<Triangle>,
    pub morph_targets: Vec<MorphTarget>,
    pub materials: MaterialList,
    pub extension: Extension,
}

impl Geometry {
    pub(crate) fn read(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Option<Self>> {
        read_chunk(reader, ChunkType::Geometry, sink, |reader, _, sink| {
            Self::read_body(reader, sink)
        })
    }

    fn read_body(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let start = reader.position();
        let header = ChunkHeader::read(reader)?;

        let format = GeometryFormat(reader.read_u32()?);
        let triangle_count = reader.read_u32()?;
        let vertex_count = reader.read_u32()?;
        let morph_target_count = reader.read_u32()?;
        let vertices = vertex_count as usize;

        let surface = if header.version < 0x34000 {
            Some(SurfaceProperties::read(reader)?)
        } else {
            None
        };

        let mut colors = None;
        let mut uv_sets = Vec::new();
        let mut triangles = Vec::new();

        if format.is_native() {
            sink.report(Diagnostic::new(
                DiagnosticKind::NativeGeometry,
                ChunkType::Geometry,
                start,
            ));
        } else {
            if format.has(GeometryFormat::PRELIT) {
                let mut values = Vec::with_capacity(reader.capacity_for(vertices, 4));
                for _ in 0..vertices {
                    values.push(reader.read_array::<4>()?);
                }
                colors = Some(values);
            }

            if format.has(GeometryFormat::TEXTURED | GeometryFormat::TEXTURED2) {
                let set_count = format.uv_set_count();
                uv_sets.reserve(set_count);
                for _ in 0..set_count {
                    let mut set = Vec::with_capacity(reader.capacity_for(vertices, 8));
                    for _ in 0..vertices {
                        set.push(reader.read_f32_array::<2>()?);
                    }
                    uv_sets.push(set);
                }
            }

            let count = triangle_count as usize;
            triangles.reserve(reader.capacity_for(count, 8));
            for _ in 0..count {
                triangles.push(Triangle {
                    vertex_b: reader.read_u16()?,
                    vertex_a: reader.read_u16()?,
                    material_id: reader.read_u16()?,
                    vertex_c: reader.read_u16()?,
                });
            }
        }

        let mut morph_targets = Vec::with_capacity(reader.capacity_for(morph_target_count as usize, 16));
        for _ in 0..morph_target_count {
            morph_targets.push(read_morph_target(reader, vertices, format.is_native())?);
        }

        let materials = MaterialList::read(reader, sink)?.unwrap_or_default();
        let extension = Extension::read(
            reader,
            ExtensionOwner::Geometry {
                vertex_count: vertices,
            },
            sink,
        )?;

        tracing::debug!(
            format = format.0,
            vertices = vertex_count,
            triangles = triangle_count,
            morph_targets = morph_target_count,
            uv_sets = uv_sets.len(),
            native = format.is_native(),
            "geometry decoded"
        );

        Ok(Self {
            offset: start.saturating_sub(ChunkHeader::SIZE),
            format,
            triangle_count,
            vertex_count,
            morph_target_count,
            surface,
            colors,
            uv_sets,
            triangles,
            morph_targets,
            materials,
            extension,
        })
    }

    pub fn is_native(&self) -> bool {
        self.format.is_native()
    }

    /// Positions of the first morph target.
    pub fn positions(&self) -> Option<&[[f32; 3]]> {
        self.morph_targets.first()?.positions.as_deref()
    }

    /// Normals of the first morph target.
    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.morph_targets.first()?.normals.as_deref()
    }

    pub fn bin_mesh(&self) -> Option<&BinMesh> {
        self.extension.bin_mesh()
    }

    pub fn skin(&self) -> Option<&Skin> {
        self.extension.skin()
    }
}

fn read_morph_target(reader: &mut BinaryReader<'_>, vertices: usize, native: bool) -> Result<MorphTarget> {
    let sphere = reader.read_f32_array::<4>()?;
    let bounding_sphere = BoundingSphere {
        center: [sphere[0], sphere[1], sphere[2]],
        radius: sphere[3],
    };

    // Native geometry keeps its vertex data in the platform blob.
    if native {
        return Ok(MorphTarget {
            bounding_sphere,
            positions: None,
            normals: None,
        });
    }

    let has_positions = reader.read_u32()? != 0;
    let has_normals = reader.read_u32()? != 0;

    let positions = if has_positions {
        Some(read_vec3s(reader, vertices)?)
    } else {
        None
    };
    let normals = if has_normals {
        Some(read_vec3s(reader, vertices)?)
    } else {
        None
    };

    Ok(MorphTarget {
        bounding_sphere,
        positions,
        normals,
    })
}

fn read_vec3s(reader: &mut BinaryReader<'_>, count: usize) -> Result<Vec<[f32; 3]>> {
    let mut out = Vec::with_capacity(reader.capacity_for(count, 12));
    for _ in 0..count {
        out.push(reader.read_f32_array::<3>()?);
    }
    Ok(out)
}

/// The geometries of a clump.
///
/// Atomics refer to geometries by position, so a slot whose chunk was
/// missing stays `None`.
#[derive(Debug, Clone, Default)]
pub struct GeometryList {
    geometries: Vec<Option<Geometry>>,
}

impl GeometryList {
    pub(crate) fn read(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Option<Self>> {
        read_chunk(reader, ChunkType::GeometryList, sink, |reader, _, sink| {
            Self::read_body(reader, sink)
        })
    }

    fn read_body(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let _struct_header = ChunkHeader::read(reader)?;
        let count = reader.read_u32()? as usize;

        let mut geometries = Vec::with_capacity(reader.capacity_for(count, ChunkHeader::SIZE));
        for _ in 0..count {
            geometries.push(Geometry::read(reader, sink)?);
        }
        Ok(Self { geometries })
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Geometry> {
        self.geometries.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Geometry>> {
        self.geometries.iter().map(Option::as_ref)
    }
}
