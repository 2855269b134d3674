//! DXT1/DXT3/DXT5 (BC1-BC3) block decompression.
//!
//! Every decoder returns exactly `width * height * 4` RGBA bytes, row-major
//! and top row first. Blocks past the end of the input decode as if they
//! were zero-filled; texels that fall outside the image are dropped.

/// A 4x4 block compression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFormat {
    Dxt1,
    Dxt3,
    Dxt5,
}

impl BlockFormat {
    /// Bytes per 4x4 block.
    pub const fn block_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 | Self::Dxt5 => 16,
        }
    }

    /// Size in bytes of one `width` x `height` level.
    pub fn level_size(self, width: usize, height: usize) -> usize {
        let blocks_x = width.div_ceil(4);
        let blocks_y = height.div_ceil(4);
        blocks_x.max(1) * blocks_y.max(1) * self.block_size()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Dxt1 => "DXT1",
            Self::Dxt3 => "DXT3",
            Self::Dxt5 => "DXT5",
        }
    }

    /// Decode one level of this format.
    pub fn decode(self, data: &[u8], width: usize, height: usize) -> Vec<u8> {
        match self {
            Self::Dxt1 => decode_dxt1(data, width, height),
            Self::Dxt3 => decode_dxt3(data, width, height),
            Self::Dxt5 => decode_dxt5(data, width, height),
        }
    }
}

type Texels = [[u8; 4]; 16];

/// Decode DXT1 data, honouring the 1-bit punch-through mode.
pub fn decode_dxt1(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    decode_blocks(data, width, height, BlockFormat::Dxt1, |block| {
        color_block(block, false)
    })
}

/// Decode DXT3 data (explicit 4-bit alpha).
pub fn decode_dxt3(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    decode_blocks(data, width, height, BlockFormat::Dxt3, |block| {
        let mut texels = color_block(&block[8..], true);
        for (i, texel) in texels.iter_mut().enumerate() {
            let byte = block[i / 2];
            let nibble = if i % 2 == 0 { byte & 0x0F } else { byte >> 4 };
            texel[3] = nibble * 17;
        }
        texels
    })
}

/// Decode DXT5 data (interpolated alpha).
pub fn decode_dxt5(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    decode_blocks(data, width, height, BlockFormat::Dxt5, |block| {
        let alphas = alpha_palette(block[0], block[1]);
        let bits = block[2..8]
            .iter()
            .rev()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));

        let mut texels = color_block(&block[8..], true);
        for (i, texel) in texels.iter_mut().enumerate() {
            texel[3] = alphas[((bits >> (i * 3)) & 0x7) as usize];
        }
        texels
    })
}

fn decode_blocks(
    data: &[u8],
    width: usize,
    height: usize,
    format: BlockFormat,
    decode_block: impl Fn(&[u8]) -> Texels,
) -> Vec<u8> {
    let mut output = vec![0u8; width * height * 4];
    let block_size = format.block_size();
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let mut block = [0u8; 16];

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let offset = (by * blocks_x + bx) * block_size;
            block.fill(0);
            if let Some(src) = data.get(offset..) {
                let n = src.len().min(block_size);
                block[..n].copy_from_slice(&src[..n]);
            }

            let texels = decode_block(&block[..block_size]);

            for py in 0..4 {
                let y = by * 4 + py;
                if y >= height {
                    break;
                }
                for px in 0..4 {
                    let x = bx * 4 + px;
                    if x >= width {
                        break;
                    }
                    let dst = (y * width + x) * 4;
                    output[dst..dst + 4].copy_from_slice(&texels[py * 4 + px]);
                }
            }
        }
    }

    output
}

/// Decode the 8-byte color half of a block. `four_color` forces the opaque
/// 4-entry palette regardless of endpoint order.
fn color_block(block: &[u8], four_color: bool) -> Texels {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);

    let e0 = expand_565(c0);
    let e1 = expand_565(c1);
    let palette = if four_color || c0 > c1 {
        [e0, e1, lerp(e0, e1, 1.0 / 3.0), lerp(e0, e1, 2.0 / 3.0)]
    } else {
        [e0, e1, lerp(e0, e1, 0.5), [0, 0, 0, 0]]
    };

    let mut texels = [[0u8; 4]; 16];
    for (i, texel) in texels.iter_mut().enumerate() {
        *texel = palette[((indices >> (i * 2)) & 0x3) as usize];
    }
    texels
}

/// RGB565 to 8-bit channels, rounded to nearest.
fn expand_565(color: u16) -> [u8; 4] {
    let r = u32::from((color >> 11) & 0x1F);
    let g = u32::from((color >> 5) & 0x3F);
    let b = u32::from(color & 0x1F);
    [
        ((r * 255 + 15) / 31) as u8,
        ((g * 255 + 31) / 63) as u8,
        ((b * 255 + 15) / 31) as u8,
        255,
    ]
}

/// Opaque interpolation between two endpoints, rounding half up.
fn lerp(c0: [u8; 4], c1: [u8; 4], t: f64) -> [u8; 4] {
    let mix = |a: u8, b: u8| {
        let a = f64::from(a);
        (a + (f64::from(b) - a) * t + 0.5).floor() as u8
    };
    [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2]), 255]
}

/// The eight-entry DXT5 alpha palette.
fn alpha_palette(a0: u8, a1: u8) -> [u8; 8] {
    let (a0w, a1w) = (u32::from(a0), u32::from(a1));
    let mut alphas = [a0, a1, 0, 0, 0, 0, 0, 255];
    if a0 > a1 {
        for i in 1..=6 {
            alphas[i + 1] = (((7 - i as u32) * a0w + i as u32 * a1w) / 7) as u8;
        }
    } else {
        for i in 1..=4 {
            alphas[i + 1] = (((5 - i as u32) * a0w + i as u32 * a1w) / 5) as u8;
        }
    }
    alphas
}
