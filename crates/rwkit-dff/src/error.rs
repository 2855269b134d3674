//! Error types for DFF decoding.

use thiserror::Error;

/// Errors that abort a DFF parse.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (out-of-bounds read or chunk overrun).
    #[error("{0}")]
    Common(#[from] rwkit_common::Error),
}

/// Result type for DFF operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a geometry cannot be turned into render groups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// A triangle or split index names a vertex that does not exist.
    #[error("vertex index {index} out of range ({vertex_count} vertices)")]
    VertexOutOfRange { index: u32, vertex_count: usize },

    /// Triangles exist but the first morph target carries no positions.
    #[error("geometry has triangles but no vertex positions")]
    MissingPositions,
}

/// Reasons a logical skeleton cannot be bound onto the frame tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkeletonError {
    /// No unbound frame carries the node id the descriptor asks for.
    #[error("skeleton descriptor {descriptor} (node id {node_id}) has no matching frame")]
    Unresolved { descriptor: usize, node_id: u32 },
}
