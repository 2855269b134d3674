//! Uncompressed pixel layouts.

use crate::native::{D3dFormat, RasterFormat};

/// Byte layout of an uncompressed level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawLayout {
    /// 32-bit B, G, R, A.
    Bgra,
    /// 32-bit B, G, R with an unused fourth byte.
    Bgrx,
    /// 24-bit B, G, R.
    Bgr,
    R5G6B5,
    A1R5G5B5,
    A4R4G4B4,
    /// Unrecognised; read as BGRA.
    Unknown,
}

impl RawLayout {
    /// Pick the layout from the D3D format when it names one, else from the
    /// raster format family.
    pub fn select(d3d_format: D3dFormat, raster_format: RasterFormat) -> Self {
        let family = raster_format.family();
        if d3d_format == D3dFormat::A8R8G8B8 || family == RasterFormat::FORMAT_8888 {
            Self::Bgra
        } else if d3d_format == D3dFormat::X8R8G8B8 {
            Self::Bgrx
        } else if family == RasterFormat::FORMAT_888 {
            Self::Bgr
        } else if d3d_format == D3dFormat::R5G6B5 || family == RasterFormat::FORMAT_565 {
            Self::R5G6B5
        } else if d3d_format == D3dFormat::A1R5G5B5 || family == RasterFormat::FORMAT_1555 {
            Self::A1R5G5B5
        } else if d3d_format == D3dFormat::A4R4G4B4 || family == RasterFormat::FORMAT_4444 {
            Self::A4R4G4B4
        } else {
            Self::Unknown
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bgra => "BGRA8888",
            Self::Bgrx => "BGRX8888",
            Self::Bgr => "BGR888",
            Self::R5G6B5 => "R5G6B5",
            Self::A1R5G5B5 => "A1R5G5B5",
            Self::A4R4G4B4 => "A4R4G4B4",
            Self::Unknown => "unknown",
        }
    }

    /// Bytes per pixel.
    pub const fn stride(self) -> usize {
        match self {
            Self::Bgra | Self::Bgrx | Self::Unknown => 4,
            Self::Bgr => 3,
            Self::R5G6B5 | Self::A1R5G5B5 | Self::A4R4G4B4 => 2,
        }
    }

    /// Decode `width * height` pixels to RGBA.
    ///
    /// Missing input bytes read as zero, except that the unknown layout
    /// treats a missing alpha byte as opaque.
    pub fn decode(self, data: &[u8], width: usize, height: usize) -> Vec<u8> {
        let count = width * height;
        let stride = self.stride();
        let byte = |i: usize| data.get(i).copied();
        let mut output = Vec::with_capacity(count * 4);

        for i in 0..count {
            let base = i * stride;
            let at = |k: usize| byte(base + k).unwrap_or(0);
            let word = || u16::from_le_bytes([at(0), at(1)]);

            let pixel = match self {
                Self::Bgra => [at(2), at(1), at(0), at(3)],
                Self::Bgrx | Self::Bgr => [at(2), at(1), at(0), 255],
                Self::R5G6B5 => {
                    let p = word();
                    [scale(p >> 11, 5), scale(p >> 5, 6), scale(p, 5), 255]
                }
                Self::A1R5G5B5 => {
                    let p = word();
                    let alpha = if p >> 15 != 0 { 255 } else { 0 };
                    [scale(p >> 10, 5), scale(p >> 5, 5), scale(p, 5), alpha]
                }
                Self::A4R4G4B4 => {
                    let p = word();
                    [scale(p >> 8, 4), scale(p >> 4, 4), scale(p, 4), scale(p >> 12, 4)]
                }
                Self::Unknown => [at(2), at(1), at(0), byte(base + 3).unwrap_or(255)],
            };
            output.extend_from_slice(&pixel);
        }

        output
    }
}

/// Rescale the low `bits` of `value` to 0-255, truncating.
#[inline]
fn scale(value: u16, bits: u32) -> u8 {
    let max = (1u32 << bits) - 1;
    ((u32::from(value) & max) * 255 / max) as u8
}

/// Decode an uncompressed level.
pub fn decode_raw(
    data: &[u8],
    width: usize,
    height: usize,
    d3d_format: D3dFormat,
    raster_format: RasterFormat,
) -> Vec<u8> {
    RawLayout::select(d3d_format, raster_format).decode(data, width, height)
}
