//! Binary reader for zero-copy parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that reads the
//! little-endian primitives RenderWare streams are made of.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// A bounds-checked cursor over an immutable byte slice.
///
/// Every read either succeeds completely or fails with
/// [`Error::UnexpectedEof`] without moving the cursor.
///
/// # Example
///
/// ```
/// use rwkit_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_u32().unwrap(), 0x08070605);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Clamp a declared element count to what the remaining bytes could hold.
    ///
    /// Used to size allocations from untrusted counts.
    #[inline]
    pub const fn capacity_for(&self, count: usize, item_size: usize) -> usize {
        let fits = if item_size == 0 {
            count
        } else {
            self.remaining() / item_size
        };
        if count < fits {
            count
        } else {
            fits
        }
    }

    /// Seek to an absolute position.
    ///
    /// The position may lie past the end of the buffer; the next read
    /// then fails with [`Error::UnexpectedEof`].
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Skip `count` bytes that must exist in the buffer.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.position += count;
        Ok(())
    }

    #[inline]
    fn ensure(&self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                position: self.position,
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size array of bytes.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read `N` consecutive little-endian f32 values.
    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0.0f32; N];
        for value in &mut out {
            *value = self.read_f32()?;
        }
        Ok(out)
    }

    /// Read a string stored in a `length`-byte field.
    ///
    /// The text ends at the first NUL or at the end of the field, whichever
    /// comes first. The cursor always ends up after the whole field and the
    /// result is trimmed. Bytes are interpreted as Latin-1, which covers the
    /// ASCII names these archives carry.
    pub fn read_fixed_string(&mut self, length: usize) -> Result<String> {
        let bytes = self.read_bytes(length)?;
        let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
        let text: String = bytes[..end].iter().map(|&b| b as char).collect();
        Ok(text.trim().to_string())
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let position = self.position;
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            position,
            needed: size,
            available: bytes.len(),
        })
    }
}
