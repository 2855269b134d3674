//! Common utilities for rwkit.
//!
//! This crate provides the foundation shared by the DFF and TXD decoders:
//!
//! - [`BinaryReader`] - Bounds-checked little-endian reading from byte slices
//! - [`ChunkHeader`] / [`ChunkType`] - RenderWare chunk headers and version derivation
//! - [`read_chunk`] - Typed chunk reads with body-length enforcement
//! - [`DiagnosticSink`] - Structured reporting of recoverable conditions

mod chunk;
mod diagnostic;
mod error;
mod reader;

#[cfg(feature = "testing")]
pub mod testing;

pub use chunk::{close_chunk, read_chunk, ChunkHeader, ChunkType};
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, KnownLayout};
