//! Materials and texture references.

use rwkit_common::{read_chunk, BinaryReader, ChunkHeader, ChunkType, DiagnosticSink};

use crate::extension::{Extension, ExtensionOwner};
use crate::Result;

/// Lighting coefficients.
///
/// Stored on geometries written before 3.4 and on materials written after
/// 3.0.4.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProperties {
    pub ambient: f32,
    pub specular: f32,
    pub diffuse: f32,
}

impl SurfaceProperties {
    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            ambient: reader.read_f32()?,
            specular: reader.read_f32()?,
            diffuse: reader.read_f32()?,
        })
    }
}

/// A material's texture binding, by name.
#[derive(Debug, Clone)]
pub struct TextureRef {
    pub filter_flags: u16,
    pub name: String,
    /// Alpha mask texture, when one is named.
    pub mask_name: Option<String>,
    pub extension: Extension,
}

impl TextureRef {
    fn read(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Option<Self>> {
        read_chunk(reader, ChunkType::Texture, sink, |reader, _, sink| {
            Self::read_body(reader, sink)
        })
    }

    fn read_body(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let _struct_header = ChunkHeader::read(reader)?;
        let filter_flags = reader.read_u16()?;
        let _reserved = reader.read_u16()?;

        let name = read_string(reader, sink)?.unwrap_or_default();
        let mask_name = read_string(reader, sink)?.filter(|mask| !mask.is_empty());
        let extension = Extension::read(reader, ExtensionOwner::Texture, sink)?;

        Ok(Self {
            filter_flags,
            name,
            mask_name,
            extension,
        })
    }
}

/// Read a String chunk.
pub(crate) fn read_string(
    reader: &mut BinaryReader<'_>,
    sink: &mut dyn DiagnosticSink,
) -> Result<Option<String>> {
    read_chunk(reader, ChunkType::String, sink, |reader, header, _| -> Result<String> {
        Ok(reader.read_fixed_string(header.length as usize)?)
    })
}

#[derive(Debug, Clone)]
pub struct Material {
    pub flags: u32,
    /// Base color, RGBA.
    pub color: [u8; 4],
    pub is_textured: bool,
    pub surface: Option<SurfaceProperties>,
    pub texture: Option<TextureRef>,
    pub extension: Extension,
}

impl Material {
    fn read(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Option<Self>> {
        read_chunk(reader, ChunkType::Material, sink, |reader, _, sink| {
            Self::read_body(reader, sink)
        })
    }

    fn read_body(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let header = ChunkHeader::read(reader)?;
        let flags = reader.read_u32()?;
        let color = reader.read_array::<4>()?;
        let _reserved = reader.read_u32()?;
        let is_textured = reader.read_u32()? != 0;

        let surface = if header.version > 0x30400 {
            Some(SurfaceProperties::read(reader)?)
        } else {
            None
        };

        let texture = if is_textured {
            TextureRef::read(reader, sink)?
        } else {
            None
        };

        let extension = Extension::read(reader, ExtensionOwner::Material, sink)?;

        Ok(Self {
            flags,
            color,
            is_textured,
            surface,
            texture,
            extension,
        })
    }
}

/// The materials of one geometry.
///
/// Entries keep their stream position so that BinMesh splits and triangle
/// material ids index them directly; a slot whose chunk was missing is
/// `None`.
#[derive(Debug, Clone, Default)]
pub struct MaterialList {
    /// Placeholder ids stored ahead of the materials.
    pub ids: Vec<u32>,
    materials: Vec<Option<Material>>,
}

impl MaterialList {
    pub(crate) fn read(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Option<Self>> {
        read_chunk(reader, ChunkType::MaterialList, sink, |reader, _, sink| {
            Self::read_body(reader, sink)
        })
    }

    fn read_body(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let _struct_header = ChunkHeader::read(reader)?;
        let count = reader.read_u32()? as usize;

        let mut ids = Vec::with_capacity(reader.capacity_for(count, 4));
        for _ in 0..count {
            ids.push(reader.read_u32()?);
        }

        let mut materials = Vec::with_capacity(ids.len());
        for _ in 0..count {
            materials.push(Material::read(reader, sink)?);
        }

        Ok(Self { ids, materials })
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Material> {
        self.materials.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Material>> {
        self.materials.iter().map(Option::as_ref)
    }

    /// Names of every texture and mask the materials reference.
    pub fn texture_names(&self) -> impl Iterator<Item = &str> {
        self.materials
            .iter()
            .flatten()
            .filter_map(|m| m.texture.as_ref())
            .flat_map(|t| std::iter::once(t.name.as_str()).chain(t.mask_name.as_deref()))
    }
}
