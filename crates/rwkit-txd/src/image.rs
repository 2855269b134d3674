//! Decoded texture images.

use crate::native::{D3dFormat, NativeHeader, PixelCodec, RasterFormat};
use crate::palette::Palette;

/// One texture, decoded to RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Name as stored, before case folding.
    pub name: String,
    pub mask_name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    /// `width * height * 4` bytes, row-major from the top row.
    pub rgba: Vec<u8>,
    pub platform: u32,
    pub filter_flags: u32,
    pub raster_format: RasterFormat,
    pub d3d_format: D3dFormat,
    pub depth: u8,
    pub raster_type: u8,
    pub compression: u8,
    /// Levels stored in the archive; only the first is decoded.
    pub mip_levels: u8,
    pub codec: PixelCodec,
    pub palette: Option<Palette>,
}

impl RasterImage {
    pub(crate) fn new(
        native: NativeHeader,
        palette: Option<Palette>,
        codec: PixelCodec,
        rgba: Vec<u8>,
    ) -> Self {
        Self {
            name: native.name,
            mask_name: native.mask_name,
            width: u32::from(native.width),
            height: u32::from(native.height),
            has_alpha: native.has_alpha,
            rgba,
            platform: native.platform,
            filter_flags: native.filter_flags,
            raster_format: native.raster_format,
            d3d_format: native.d3d_format,
            depth: native.depth,
            raster_type: native.raster_type,
            compression: native.compression,
            mip_levels: native.mip_levels,
            codec,
            palette,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.rgba.get(offset..offset + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Whether any pixel is not fully opaque.
    pub fn is_translucent(&self) -> bool {
        self.rgba.chunks_exact(4).any(|p| p[3] != 255)
    }
}
