//! RenderWare DFF scene archive decoder.
//!
//! DFF files (GTA III, Vice City and San Andreas era) store models as a tree
//! of chunks rooted at a Clump. This crate decodes that tree into plain data
//! and provides the two transforms a renderer needs on top of it.
//!
//! # File Format
//!
//! ```text
//! Clump
//! ├── Struct          atomic count (+ light and camera counts)
//! ├── FrameList       transform hierarchy, one Extension per frame
//! ├── GeometryList
//! │   └── Geometry    vertex arrays, triangles, morph targets
//! │       ├── MaterialList
//! │       │   └── Material ── Texture
//! │       └── Extension   BinMesh, Skin, ...
//! ├── Atomic *        frame index + geometry index
//! └── Extension
//! ```
//!
//! # Transforms
//!
//! - [`assemble`] turns a geometry into material-grouped, per-corner vertex
//!   data using its BinMesh splits or triangle material ids.
//! - [`resolve_skeleton`] binds the HAnim node list onto frames.
//!
//! [`Model::build`] runs both for every atomic.
//!
//! # Example
//!
//! ```no_run
//! use rwkit_common::TracingSink;
//! use rwkit_dff::{Clump, Model};
//!
//! let data = std::fs::read("player.dff")?;
//! let mut sink = TracingSink::new();
//!
//! if let Some(clump) = Clump::parse(&data, &mut sink)? {
//!     for frame in &clump.frames {
//!         println!("{}", frame.name().unwrap_or("<unnamed>"));
//!     }
//!
//!     let model = Model::build(&clump, &mut sink);
//!     println!("{} vertices", model.vertex_count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod assembly;
mod clump;
mod error;
mod extension;
mod frame;
mod geometry;
mod material;
mod model;
pub mod plugins;
mod skeleton;

#[cfg(test)]
mod fixtures;

pub use assembly::{assemble, AssembledMesh, RenderGroup, SkinAttributes};
pub use clump::{Atomic, Clump};
pub use error::{AssemblyError, Error, Result, SkeletonError};
pub use extension::{Extension, ExtensionOwner, Plugin, PluginKind};
pub use frame::{Frame, FrameList};
pub use geometry::{BoundingSphere, Geometry, GeometryFormat, GeometryList, MorphTarget, Triangle};
pub use material::{Material, MaterialList, SurfaceProperties, TextureRef};
pub use model::{Model, ModelPart};
pub use skeleton::{resolve_skeleton, Bone, Skeleton};
