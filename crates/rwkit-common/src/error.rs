//! Error types for rwkit-common.

use thiserror::Error;

use crate::ChunkType;

/// Common error type for rwkit operations.
///
/// Both variants are fatal: they abort the parse that raised them.
#[derive(Debug, Error)]
pub enum Error {
    /// A primitive read would run past the end of the buffer.
    #[error("unexpected end of buffer at offset {position:#x}: needed {needed} bytes but only {available} available")]
    UnexpectedEof {
        position: usize,
        needed: usize,
        available: usize,
    },

    /// A chunk body decoder read past the chunk's declared length.
    #[error("read past the end of chunk {chunk} at offset {start:#x}: declared {declared} bytes, consumed {consumed}")]
    ChunkOverrun {
        chunk: ChunkType,
        start: usize,
        declared: u32,
        consumed: usize,
    },
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
