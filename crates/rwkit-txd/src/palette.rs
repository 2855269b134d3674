//! 4- and 8-bit palette expansion.

use rwkit_common::BinaryReader;

use crate::Result;

/// An RGBA color table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<[u8; 4]>,
}

impl Palette {
    /// Read `count` entries stored as B, G, R, A.
    pub(crate) fn read(reader: &mut BinaryReader<'_>, count: usize) -> Result<Self> {
        let bytes = reader.read_bytes(count * 4)?;
        let entries = bytes
            .chunks_exact(4)
            .map(|e| [e[2], e[1], e[0], e[3]])
            .collect();
        Ok(Self { entries })
    }

    pub fn from_rgba(entries: Vec<[u8; 4]>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[[u8; 4]] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn lookup(&self, index: u8) -> [u8; 4] {
        self.entries
            .get(index as usize)
            .copied()
            .unwrap_or([0; 4])
    }
}

/// Expand 8-bit indices, one byte per pixel.
pub fn decode_pal8(data: &[u8], palette: &Palette, width: usize, height: usize) -> Vec<u8> {
    let count = width * height;
    let mut output = Vec::with_capacity(count * 4);
    for i in 0..count {
        let index = data.get(i).copied().unwrap_or(0);
        output.extend_from_slice(&palette.lookup(index));
    }
    output
}

/// Expand 4-bit indices, two pixels per byte with the even pixel in the
/// low nibble.
pub fn decode_pal4(data: &[u8], palette: &Palette, width: usize, height: usize) -> Vec<u8> {
    let count = width * height;
    let mut output = Vec::with_capacity(count * 4);
    for i in 0..count {
        let byte = data.get(i / 2).copied().unwrap_or(0);
        let index = if i % 2 == 0 { byte & 0x0F } else { byte >> 4 };
        output.extend_from_slice(&palette.lookup(index));
    }
    output
}
