//! RenderWare chunk headers and typed chunk reads.
//!
//! Every record in a RenderWare stream starts with a 12-byte header:
//!
//! | offset | size | field  |
//! |--------|------|--------|
//! | 0      | 4    | type   |
//! | 4      | 4    | length (bytes after the header) |
//! | 8      | 4    | build  |
//!
//! The build word encodes the library version that wrote the chunk. Some
//! record layouts depend on it, so [`ChunkHeader`] derives the version up
//! front.

use std::fmt;

use crate::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::{BinaryReader, Error, Result};

/// Chunk type identifiers.
///
/// Only the kinds the decoders understand get their own variant; anything
/// else round-trips through [`ChunkType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkType {
    Struct,
    String,
    Extension,
    Camera,
    Texture,
    Material,
    MaterialList,
    FrameList,
    Geometry,
    Clump,
    Light,
    Atomic,
    TextureNative,
    TexDictionary,
    GeometryList,
    Morph,
    Skin,
    HAnim,
    MaterialEffects,
    BinMesh,
    NativeData,
    /// Rockstar mesh extension plugin.
    MeshExtension,
    /// Rockstar node name plugin, attached to frames.
    FrameName,
    Unknown(u32),
}

impl ChunkType {
    /// Map a raw type id to a chunk type.
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0x0001 => Self::Struct,
            0x0002 => Self::String,
            0x0003 => Self::Extension,
            0x0005 => Self::Camera,
            0x0006 => Self::Texture,
            0x0007 => Self::Material,
            0x0008 => Self::MaterialList,
            0x000E => Self::FrameList,
            0x000F => Self::Geometry,
            0x0010 => Self::Clump,
            0x0012 => Self::Light,
            0x0014 => Self::Atomic,
            0x0015 => Self::TextureNative,
            0x0016 => Self::TexDictionary,
            0x001A => Self::GeometryList,
            0x0105 => Self::Morph,
            0x0116 => Self::Skin,
            0x011E => Self::HAnim,
            0x0120 => Self::MaterialEffects,
            0x050E => Self::BinMesh,
            0x0510 => Self::NativeData,
            0x0253_F2FD => Self::MeshExtension,
            0x0253_F2FE => Self::FrameName,
            other => Self::Unknown(other),
        }
    }

    /// The raw type id.
    pub const fn raw(self) -> u32 {
        match self {
            Self::Struct => 0x0001,
            Self::String => 0x0002,
            Self::Extension => 0x0003,
            Self::Camera => 0x0005,
            Self::Texture => 0x0006,
            Self::Material => 0x0007,
            Self::MaterialList => 0x0008,
            Self::FrameList => 0x000E,
            Self::Geometry => 0x000F,
            Self::Clump => 0x0010,
            Self::Light => 0x0012,
            Self::Atomic => 0x0014,
            Self::TextureNative => 0x0015,
            Self::TexDictionary => 0x0016,
            Self::GeometryList => 0x001A,
            Self::Morph => 0x0105,
            Self::Skin => 0x0116,
            Self::HAnim => 0x011E,
            Self::MaterialEffects => 0x0120,
            Self::BinMesh => 0x050E,
            Self::NativeData => 0x0510,
            Self::MeshExtension => 0x0253_F2FD,
            Self::FrameName => 0x0253_F2FE,
            Self::Unknown(raw) => raw,
        }
    }

    /// A short human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Struct => "Struct",
            Self::String => "String",
            Self::Extension => "Extension",
            Self::Camera => "Camera",
            Self::Texture => "Texture",
            Self::Material => "Material",
            Self::MaterialList => "MaterialList",
            Self::FrameList => "FrameList",
            Self::Geometry => "Geometry",
            Self::Clump => "Clump",
            Self::Light => "Light",
            Self::Atomic => "Atomic",
            Self::TextureNative => "TextureNative",
            Self::TexDictionary => "TexDictionary",
            Self::GeometryList => "GeometryList",
            Self::Morph => "Morph",
            Self::Skin => "Skin",
            Self::HAnim => "HAnim",
            Self::MaterialEffects => "MaterialEffects",
            Self::BinMesh => "BinMesh",
            Self::NativeData => "NativeData",
            Self::MeshExtension => "MeshExtension",
            Self::FrameName => "FrameName",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "Unknown({:#x})", raw),
            other => f.write_str(other.name()),
        }
    }
}

/// A decoded chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Chunk type.
    pub chunk_type: ChunkType,
    /// Body length in bytes, not counting the header.
    pub length: u32,
    /// Raw library build word.
    pub build: u32,
    /// Library version derived from `build`, e.g. `0x36003` for 3.6.0.3.
    pub version: u32,
}

impl ChunkHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 12;

    /// Create a header, deriving the version from the build word.
    pub const fn new(chunk_type: ChunkType, length: u32, build: u32) -> Self {
        Self {
            chunk_type,
            length,
            build,
            version: Self::derive_version(build),
        }
    }

    /// Derive the library version from a build word.
    ///
    /// Builds from 3.1 onward pack the version into the high half; older
    /// streams store a bare version number that is shifted into place.
    pub const fn derive_version(build: u32) -> u32 {
        if build & 0xFFFF_0000 != 0 {
            ((build >> 14) & 0x3FF00) | ((build >> 16) & 0x3F) | 0x30000
        } else {
            build << 8
        }
    }

    /// Read a header at the reader's position.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let chunk_type = ChunkType::from_raw(reader.read_u32()?);
        let length = reader.read_u32()?;
        let build = reader.read_u32()?;
        Ok(Self::new(chunk_type, length, build))
    }

    /// Absolute end offset of the body that starts at `body_start`.
    #[inline]
    pub const fn end(&self, body_start: usize) -> usize {
        body_start.saturating_add(self.length as usize)
    }
}

/// Read a chunk of the `expected` type and decode its body.
///
/// On a type mismatch the mismatched chunk is skipped by its declared
/// length and `Ok(None)` is returned; a [`DiagnosticKind::ChunkMismatch`]
/// is reported unless a Clump was expected, since callers scan for the
/// Clump chunk by chunk.
///
/// After `decode` returns, the cursor must sit exactly at the end of the
/// body; see [`close_chunk`].
pub fn read_chunk<'a, T, E, F>(
    reader: &mut BinaryReader<'a>,
    expected: ChunkType,
    sink: &mut dyn DiagnosticSink,
    decode: F,
) -> std::result::Result<Option<T>, E>
where
    E: From<Error>,
    F: FnOnce(&mut BinaryReader<'a>, &ChunkHeader, &mut dyn DiagnosticSink) -> std::result::Result<T, E>,
{
    let start = reader.position();
    let header = ChunkHeader::read(reader)?;
    let body_start = reader.position();

    if header.chunk_type != expected {
        if expected != ChunkType::Clump {
            sink.report(
                Diagnostic::new(
                    DiagnosticKind::ChunkMismatch {
                        expected,
                        found: header.chunk_type,
                    },
                    header.chunk_type,
                    start,
                )
                .with_declared(header.length),
            );
        }
        reader.seek(header.end(body_start));
        return Ok(None);
    }

    let value = decode(reader, &header, &mut *sink)?;
    close_chunk(reader, &header, body_start, sink)?;
    Ok(Some(value))
}

/// Enforce that the cursor sits exactly at the end of a chunk body.
///
/// Under-consumption is reported and the cursor is moved to the boundary.
/// Over-consumption is an [`Error::ChunkOverrun`].
pub fn close_chunk(
    reader: &mut BinaryReader<'_>,
    header: &ChunkHeader,
    body_start: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<()> {
    let end = header.end(body_start);
    let position = reader.position();
    let consumed = position.saturating_sub(body_start);

    if position < end {
        sink.report(
            Diagnostic::new(DiagnosticKind::UnderConsumption, header.chunk_type, body_start)
                .with_declared(header.length)
                .with_consumed(consumed),
        );
        reader.seek(end);
    } else if position > end {
        return Err(Error::ChunkOverrun {
            chunk: header.chunk_type,
            start: body_start,
            declared: header.length,
            consumed,
        });
    }
    Ok(())
}
