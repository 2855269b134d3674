//! Builders for synthetic RenderWare streams.
//!
//! Only compiled with the `testing` feature; the decoder crates enable it
//! for their unit tests.

use crate::ChunkType;

/// Build word for RenderWare 3.6.0.3 (GTA San Andreas).
pub const BUILD_3_6: u32 = 0x1803_FFFF;

/// Little-endian byte writer with nested chunk support.
#[derive(Debug, Default, Clone)]
pub struct ChunkWriter {
    buf: Vec<u8>,
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32s(&mut self, values: &[f32]) -> &mut Self {
        for &value in values {
            self.f32(value);
        }
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Write `text` into a NUL-padded field of `width` bytes.
    pub fn fixed_str(&mut self, text: &str, width: usize) -> &mut Self {
        let mut field = vec![0u8; width];
        let n = text.len().min(width);
        field[..n].copy_from_slice(&text.as_bytes()[..n]);
        self.bytes(&field)
    }

    /// Write a chunk whose body is produced by `body`; the length is filled in.
    pub fn chunk(
        &mut self,
        chunk_type: ChunkType,
        build: u32,
        body: impl FnOnce(&mut ChunkWriter),
    ) -> &mut Self {
        let mut inner = ChunkWriter::new();
        body(&mut inner);
        self.raw_chunk(chunk_type.raw(), inner.buf.len() as u32, build, &inner.buf)
    }

    /// Write a chunk header with an arbitrary declared length.
    pub fn raw_chunk(&mut self, raw_type: u32, length: u32, build: u32, body: &[u8]) -> &mut Self {
        self.u32(raw_type).u32(length).u32(build).bytes(body)
    }

    /// Shorthand for a Struct chunk at [`BUILD_3_6`].
    pub fn struct_chunk(&mut self, body: impl FnOnce(&mut ChunkWriter)) -> &mut Self {
        self.chunk(ChunkType::Struct, BUILD_3_6, body)
    }

    /// Shorthand for an empty Extension chunk at [`BUILD_3_6`].
    pub fn empty_extension(&mut self) -> &mut Self {
        self.chunk(ChunkType::Extension, BUILD_3_6, |_| {})
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(&self) -> Vec<u8> {
        self.buf.clone()
    }
}
