//! TextureNative entries: the per-texture header and level 0 pixels.

use std::fmt;

use rwkit_common::{
    close_chunk, BinaryReader, ChunkHeader, ChunkType, Diagnostic, DiagnosticKind, DiagnosticSink,
};

use crate::dxt::BlockFormat;
use crate::image::RasterImage;
use crate::palette::{decode_pal4, decode_pal8, Palette};
use crate::raw::RawLayout;
use crate::{Error, Result};

/// Direct3D 8 (PC) texture layout.
pub const PLATFORM_D3D8: u32 = 8;
/// Direct3D 9 (PC) texture layout.
pub const PLATFORM_D3D9: u32 = 9;

/// Raster format word: pixel family in bits 8-11, palette and mipmap flags
/// above.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RasterFormat(pub u32);

impl RasterFormat {
    pub const FORMAT_DEFAULT: u32 = 0x0000;
    pub const FORMAT_1555: u32 = 0x0100;
    pub const FORMAT_565: u32 = 0x0200;
    pub const FORMAT_4444: u32 = 0x0300;
    pub const FORMAT_LUM8: u32 = 0x0400;
    pub const FORMAT_8888: u32 = 0x0500;
    pub const FORMAT_888: u32 = 0x0600;
    pub const FORMAT_555: u32 = 0x0A00;

    pub const AUTO_MIPMAP: u32 = 0x1000;
    pub const PAL8: u32 = 0x2000;
    pub const PAL4: u32 = 0x4000;
    pub const MIPMAP: u32 = 0x8000;

    const FAMILY_MASK: u32 = 0x0F00;

    #[inline]
    pub const fn has(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    /// The pixel family bits.
    #[inline]
    pub const fn family(self) -> u32 {
        self.0 & Self::FAMILY_MASK
    }

    /// Number of palette entries stored ahead of level 0, if paletted.
    pub const fn palette_size(self) -> Option<usize> {
        if self.has(Self::PAL8) {
            Some(256)
        } else if self.has(Self::PAL4) {
            Some(16)
        } else {
            None
        }
    }
}

/// Direct3D surface format code. Block formats use their FourCC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct D3dFormat(pub u32);

impl D3dFormat {
    pub const A8R8G8B8: Self = Self(21);
    pub const X8R8G8B8: Self = Self(22);
    pub const R5G6B5: Self = Self(23);
    pub const X1R5G5B5: Self = Self(24);
    pub const A1R5G5B5: Self = Self(25);
    pub const A4R4G4B4: Self = Self(26);
    pub const P8: Self = Self(41);
    pub const DXT1: Self = Self(u32::from_le_bytes(*b"DXT1"));
    pub const DXT2: Self = Self(u32::from_le_bytes(*b"DXT2"));
    pub const DXT3: Self = Self(u32::from_le_bytes(*b"DXT3"));
    pub const DXT4: Self = Self(u32::from_le_bytes(*b"DXT4"));
    pub const DXT5: Self = Self(u32::from_le_bytes(*b"DXT5"));

    /// Whether surfaces of this format carry alpha.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::DXT3 | Self::DXT5 | Self::A8R8G8B8 | Self::A4R4G4B4 | Self::A1R5G5B5
        )
    }
}

impl fmt::Display for D3dFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_le_bytes();
        if bytes.iter().all(u8::is_ascii_alphanumeric) {
            bytes.iter().try_for_each(|&b| write!(f, "{}", b as char))
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// How level 0 is turned into RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelCodec {
    Block(BlockFormat),
    Palette8,
    Palette4,
    Raw(RawLayout),
}

impl PixelCodec {
    /// Choose a decoder from the compression code, falling back to the
    /// palette flags and then to the raw layout.
    pub fn select(compression: u8, raster_format: RasterFormat, d3d_format: D3dFormat) -> Self {
        match compression {
            1 | 8 => Self::Block(BlockFormat::Dxt1),
            3 | 9 => Self::Block(BlockFormat::Dxt3),
            5 => Self::Block(BlockFormat::Dxt5),
            _ if raster_format.has(RasterFormat::PAL8) => Self::Palette8,
            _ if raster_format.has(RasterFormat::PAL4) => Self::Palette4,
            _ => Self::Raw(RawLayout::select(d3d_format, raster_format)),
        }
    }

    /// Bytes a full `width` x `height` level occupies in this encoding.
    pub fn level_size(self, width: usize, height: usize) -> usize {
        let pixels = width.saturating_mul(height);
        match self {
            Self::Block(format) => format.level_size(width, height),
            Self::Palette8 => pixels,
            Self::Palette4 => pixels.div_ceil(2),
            Self::Raw(layout) => pixels.saturating_mul(layout.stride()),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Block(format) => format.name(),
            Self::Palette8 => "PAL8",
            Self::Palette4 => "PAL4",
            Self::Raw(layout) => layout.name(),
        }
    }
}

/// The fixed part of a TextureNative struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeHeader {
    pub platform: u32,
    pub filter_flags: u32,
    pub name: String,
    pub mask_name: Option<String>,
    pub raster_format: RasterFormat,
    /// Zero on D3D8, which does not record one.
    pub d3d_format: D3dFormat,
    pub width: u16,
    pub height: u16,
    pub depth: u8,
    pub mip_levels: u8,
    pub raster_type: u8,
    pub compression: u8,
    pub has_alpha: bool,
}

impl NativeHeader {
    /// Read the fields that follow the platform id.
    fn read(reader: &mut BinaryReader<'_>, platform: u32) -> Result<Self> {
        let filter_flags = reader.read_u32()?;
        let name = reader.read_fixed_string(32)?;
        let mask_name = Some(reader.read_fixed_string(32)?).filter(|m| !m.is_empty());
        let raster_format = RasterFormat(reader.read_u32()?);

        let (d3d_format, alpha_flag) = if platform == PLATFORM_D3D9 {
            (D3dFormat(reader.read_u32()?), None)
        } else {
            (D3dFormat::default(), Some(reader.read_u32()? != 0))
        };

        let width = reader.read_u16()?;
        let height = reader.read_u16()?;
        let depth = reader.read_u8()?;
        let mip_levels = reader.read_u8()?;
        let raster_type = reader.read_u8()?;
        let compression = reader.read_u8()?;

        Ok(Self {
            platform,
            filter_flags,
            name,
            mask_name,
            raster_format,
            d3d_format,
            width,
            height,
            depth,
            mip_levels,
            raster_type,
            compression,
            has_alpha: alpha_flag.unwrap_or_else(|| d3d_format.has_alpha()),
        })
    }

    pub fn codec(&self) -> PixelCodec {
        PixelCodec::select(self.compression, self.raster_format, self.d3d_format)
    }
}

/// Decode the body of a TextureNative chunk whose header has been read.
///
/// Returns `Ok(None)` for platforms other than D3D8/D3D9, after skipping to
/// the chunk end. On success the cursor has been checked against the chunk
/// boundary.
pub(crate) fn read_texture_native(
    reader: &mut BinaryReader<'_>,
    header: &ChunkHeader,
    start: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<Option<RasterImage>> {
    let body_start = start + ChunkHeader::SIZE;
    let _struct_header = ChunkHeader::read(reader)?;

    let platform = reader.read_u32()?;
    if platform != PLATFORM_D3D8 && platform != PLATFORM_D3D9 {
        sink.report(
            Diagnostic::new(
                DiagnosticKind::UnsupportedPlatform { platform },
                ChunkType::TextureNative,
                start,
            )
            .with_declared(header.length),
        );
        reader.seek(header.end(body_start));
        return Ok(None);
    }

    let native = NativeHeader::read(reader, platform)?;
    let palette = match native.raster_format.palette_size() {
        Some(count) => Some(Palette::read(reader, count)?),
        None => None,
    };

    let level_size = reader.read_u32()? as usize;
    let level = reader.read_bytes(level_size)?;

    let (width, height) = (native.width as usize, native.height as usize);
    let codec = native.codec();

    // Short levels are zero-padded, but a level larger than its whole entry
    // means the dimensions are bogus.
    let needed = codec.level_size(width, height);
    if needed > header.length as usize {
        return Err(Error::LevelTooLarge {
            width: native.width,
            height: native.height,
            needed,
            declared: header.length,
        });
    }
    let empty = Palette::default();
    let table = palette.as_ref().unwrap_or(&empty);
    let rgba = match codec {
        PixelCodec::Block(format) => {
            if level.len() < format.level_size(width, height) {
                tracing::trace!(name = %native.name, size = level.len(), "short block level, zero-padding");
            }
            format.decode(level, width, height)
        }
        PixelCodec::Palette8 => decode_pal8(level, table, width, height),
        PixelCodec::Palette4 => decode_pal4(level, table, width, height),
        PixelCodec::Raw(layout) => layout.decode(level, width, height),
    };

    for _ in 1..native.mip_levels {
        let size = reader.read_u32()? as usize;
        reader.skip(size)?;
    }

    let extension = ChunkHeader::read(reader)?;
    reader.skip(extension.length as usize)?;

    close_chunk(reader, header, body_start, sink)?;

    tracing::debug!(
        name = %native.name,
        width,
        height,
        codec = codec.name(),
        "texture decoded"
    );

    Ok(Some(RasterImage::new(native, palette, codec, rgba)))
}
