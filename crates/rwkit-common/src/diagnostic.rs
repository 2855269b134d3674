//! Structured diagnostics for recoverable decode conditions.
//!
//! Decoders never log on their own. Whatever they skip, pad over or give up
//! on is described as a [`Diagnostic`] and handed to a caller-supplied
//! [`DiagnosticSink`].

use std::fmt;

use crate::ChunkType;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A chunk of a different type sat where `expected` was required.
    ChunkMismatch { expected: ChunkType, found: ChunkType },
    /// A chunk body ended before its declared length; the rest was skipped.
    UnderConsumption,
    /// The same plugin appeared twice in one extension; the later one wins.
    DuplicateExtension,
    /// Geometry stored in platform-native form; its colors, UVs and
    /// triangles were not decoded.
    NativeGeometry,
    /// A plugin payload variant that is recognised but not decoded.
    NotImplemented,
    /// A plugin appeared under an owner that cannot carry it.
    UnexpectedPlugin { owner: &'static str },
    /// A frame's parent index does not name an earlier frame.
    InvalidFrameParent { frame: usize, parent: i32 },
    /// A texture entry targets a platform this decoder does not handle.
    UnsupportedPlatform { platform: u32 },
    /// A texture entry failed to decode and was skipped.
    TextureFailed { index: usize, reason: String },
    /// Two textures share a name; the later one replaces the earlier.
    DuplicateTexture { name: String },
    /// A geometry could not be assembled into render groups.
    AssemblyFailed { geometry: usize, reason: String },
    /// The skeleton could not be bound onto the frame tree.
    SkeletonUnresolved { descriptor: usize, node_id: u32 },
}

impl DiagnosticKind {
    /// Whether this is worth surfacing at warning level.
    ///
    /// Trailing padding inside chunks is common in shipped files.
    pub fn is_warning(&self) -> bool {
        !matches!(self, Self::UnderConsumption)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChunkMismatch { expected, found } => {
                write!(f, "expected chunk {}, found {}", expected, found)
            }
            Self::UnderConsumption => f.write_str("chunk not read to end"),
            Self::DuplicateExtension => f.write_str("duplicate extension"),
            Self::NativeGeometry => f.write_str("native geometry data not decoded"),
            Self::NotImplemented => f.write_str("payload variant not implemented"),
            Self::UnexpectedPlugin { owner } => write!(f, "plugin not valid on {}", owner),
            Self::InvalidFrameParent { frame, parent } => {
                write!(f, "frame {} has invalid parent index {}", frame, parent)
            }
            Self::UnsupportedPlatform { platform } => {
                write!(f, "unsupported texture platform {}", platform)
            }
            Self::TextureFailed { index, reason } => {
                write!(f, "texture {} skipped: {}", index, reason)
            }
            Self::DuplicateTexture { name } => write!(f, "duplicate texture \"{}\"", name),
            Self::AssemblyFailed { geometry, reason } => {
                write!(f, "geometry {} not assembled: {}", geometry, reason)
            }
            Self::SkeletonUnresolved {
                descriptor,
                node_id,
            } => write!(
                f,
                "skeleton node {} (descriptor {}) has no matching frame",
                node_id, descriptor
            ),
        }
    }
}

/// A recoverable condition met while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The chunk being decoded when it happened.
    pub chunk: ChunkType,
    /// Byte offset in the input buffer.
    pub position: usize,
    /// Declared body length of the chunk, when relevant.
    pub declared: Option<u32>,
    /// Bytes actually consumed from the body, when relevant.
    pub consumed: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, chunk: ChunkType, position: usize) -> Self {
        Self {
            kind,
            chunk,
            position,
            declared: None,
            consumed: None,
        }
    }

    pub fn with_declared(mut self, declared: u32) -> Self {
        self.declared = Some(declared);
        self
    }

    pub fn with_consumed(mut self, consumed: usize) -> Self {
        self.consumed = Some(consumed);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {:#x} in {}", self.kind, self.position, self.chunk)?;
        match (self.declared, self.consumed) {
            (Some(declared), Some(consumed)) => {
                write!(f, " ({} of {} bytes consumed)", consumed, declared)
            }
            (Some(declared), None) => write!(f, " ({} bytes)", declared),
            _ => Ok(()),
        }
    }
}

/// Receiver for diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards diagnostics to `tracing`.
///
/// Warnings go out at `warn` level, everything else at `debug`.
#[derive(Debug, Default)]
pub struct TracingSink {
    warnings: usize,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of warning-level diagnostics seen so far.
    pub fn warnings(&self) -> usize {
        self.warnings
    }
}

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.kind.is_warning() {
            self.warnings += 1;
            tracing::warn!(
                chunk = %diagnostic.chunk,
                position = diagnostic.position,
                declared = ?diagnostic.declared,
                consumed = ?diagnostic.consumed,
                "{}",
                diagnostic.kind
            );
        } else {
            tracing::debug!(
                chunk = %diagnostic.chunk,
                position = diagnostic.position,
                declared = ?diagnostic.declared,
                consumed = ?diagnostic.consumed,
                "{}",
                diagnostic.kind
            );
        }
    }
}
