//! RenderWare TXD texture dictionary decoding.
//!
//! A TXD archive is a TexDictionary chunk holding one TextureNative chunk per
//! texture. Each entry is decoded to RGBA8 from its first mip level:
//!
//! - DXT1, DXT3 and DXT5 block compression (see [`dxt`])
//! - 4- and 8-bit palettes (see [`palette`])
//! - uncompressed 32/24/16-bit layouts (see [`raw`])
//!
//! Only the PC Direct3D 8 and Direct3D 9 layouts are handled; entries for
//! other platforms are skipped and reported.
//!
//! # Example
//!
//! ```no_run
//! use rwkit_common::TracingSink;
//! use rwkit_txd::TextureDictionary;
//!
//! let data = std::fs::read("models/generic.txd")?;
//! let txd = TextureDictionary::parse(&data, &mut TracingSink::new())?;
//!
//! if let Some(image) = txd.get("wheel_rim") {
//!     println!("{}x{} {}", image.width, image.height, image.codec.name());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod dictionary;
pub mod dxt;
mod error;
mod image;
mod native;
pub mod palette;
pub mod raw;

pub use dictionary::TextureDictionary;
pub use dxt::{decode_dxt1, decode_dxt3, decode_dxt5, BlockFormat};
pub use error::{Error, Result};
pub use image::RasterImage;
pub use native::{D3dFormat, NativeHeader, PixelCodec, RasterFormat, PLATFORM_D3D8, PLATFORM_D3D9};
pub use palette::{decode_pal4, decode_pal8, Palette};
pub use raw::{decode_raw, RawLayout};
