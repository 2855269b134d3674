//! rwkit - RenderWare model and texture decoding.
//!
//! This crate provides a unified interface to the rwkit library crates.
//!
//! # Crates
//!
//! - [`rwkit_common`] - Common utilities (binary reading, chunk headers, diagnostics)
//! - [`rwkit_dff`] - DFF scene archives: frames, geometry, skinning, triangle assembly
//! - [`rwkit_txd`] - TXD texture dictionaries with DXT and palette decoding
//!
//! # Example
//!
//! ```no_run
//! use rwkit::prelude::*;
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//!
//! let dff = std::fs::read("models/infernus.dff")?;
//! let txd = std::fs::read("models/infernus.txd")?;
//!
//! let clump = Clump::parse(&dff, &mut diagnostics)?.ok_or("no clump")?;
//! let textures = TextureDictionary::parse(&txd, &mut diagnostics)?;
//! let model = Model::build(&clump, &mut diagnostics);
//!
//! for part in &model.parts {
//!     let Some(geometry) = clump.geometries.get(part.geometry) else {
//!         continue;
//!     };
//!     for group in &part.mesh.groups {
//!         let texture = geometry
//!             .materials
//!             .get(group.material_index as usize)
//!             .and_then(|m| m.texture.as_ref())
//!             .and_then(|t| textures.get(&t.name));
//!         println!("{} triangles, texture: {:?}", group.triangles.len(), texture.map(|t| &t.name));
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use rwkit_common as common;
pub use rwkit_dff as dff;
pub use rwkit_txd as txd;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use rwkit_common::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
    pub use rwkit_dff::{assemble, resolve_skeleton, AssembledMesh, Clump, Model, Skeleton};
    pub use rwkit_txd::{RasterImage, TextureDictionary};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
