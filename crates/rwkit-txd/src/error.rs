//! Error types for TXD decoding.

use rwkit_common::ChunkType;
use thiserror::Error;

/// Errors that abort a texture dictionary parse.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (out-of-bounds read or chunk overrun).
    #[error("{0}")]
    Common(#[from] rwkit_common::Error),

    /// The stream does not start with a TexDictionary chunk.
    #[error("not a texture dictionary: first chunk is {found}")]
    NotATextureDictionary { found: ChunkType },

    /// Level 0 would need more bytes than the whole entry declares.
    #[error("{width}x{height} level needs {needed} bytes, entry declares {declared}")]
    LevelTooLarge {
        width: u16,
        height: u16,
        needed: usize,
        declared: u32,
    },
}

/// Result type for TXD operations.
pub type Result<T> = std::result::Result<T, Error>;
