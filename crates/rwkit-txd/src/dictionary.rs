//! The TexDictionary container.

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use rwkit_common::{BinaryReader, ChunkHeader, ChunkType, Diagnostic, DiagnosticKind, DiagnosticSink};

use crate::image::RasterImage;
use crate::native::read_texture_native;
use crate::{Error, Result};

/// Fast hash map using FxHasher.
type FxHashMap<K, V> = FastHashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// A decoded texture archive, keyed by lower-cased texture name.
#[derive(Debug, Clone, Default)]
pub struct TextureDictionary {
    device_id: u16,
    declared_count: u16,
    textures: FxHashMap<String, RasterImage>,
}

impl TextureDictionary {
    /// Decode a TXD archive.
    ///
    /// Entries that fail to decode, target another platform or repeat a
    /// name are reported to `sink`; the rest are kept. Only a stream that
    /// does not start with a TexDictionary, or whose dictionary header is
    /// truncated, is an error.
    pub fn parse(data: &[u8], sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let mut reader = BinaryReader::new(data);

        let header = ChunkHeader::read(&mut reader)?;
        if header.chunk_type != ChunkType::TexDictionary {
            return Err(Error::NotATextureDictionary {
                found: header.chunk_type,
            });
        }

        let struct_header = ChunkHeader::read(&mut reader)?;
        let struct_end = struct_header.end(reader.position());
        let declared_count = reader.read_u16()?;
        let device_id = reader.read_u16()?;
        reader.seek(struct_end.max(reader.position()));

        let mut textures = FxHashMap::default();
        textures.reserve(reader.capacity_for(declared_count as usize, ChunkHeader::SIZE));

        for index in 0..declared_count as usize {
            if reader.remaining() < ChunkHeader::SIZE {
                sink.report(Diagnostic::new(
                    DiagnosticKind::TextureFailed {
                        index,
                        reason: "entry header past end of data".to_string(),
                    },
                    ChunkType::TexDictionary,
                    reader.position(),
                ));
                break;
            }

            let Some(image) = read_entry(&mut reader, index, sink)? else {
                continue;
            };

            let key = image.name.to_lowercase();
            if textures.contains_key(&key) {
                sink.report(Diagnostic::new(
                    DiagnosticKind::DuplicateTexture { name: key.clone() },
                    ChunkType::TextureNative,
                    reader.position(),
                ));
            }
            textures.insert(key, image);
        }

        tracing::debug!(
            declared = declared_count,
            decoded = textures.len(),
            device_id,
            "texture dictionary decoded"
        );

        Ok(Self {
            device_id,
            declared_count,
            textures,
        })
    }

    /// Look a texture up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&RasterImage> {
        self.textures.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of decoded textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Texture count recorded in the archive header.
    pub fn declared_count(&self) -> u16 {
        self.declared_count
    }

    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    /// `(lower-cased name, image)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RasterImage)> {
        self.textures.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Lower-cased names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.textures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn into_textures(self) -> impl Iterator<Item = (String, RasterImage)> {
        self.textures.into_iter()
    }
}

/// Decode one entry, confining failures to the entry's own bytes.
fn read_entry(
    reader: &mut BinaryReader<'_>,
    index: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<Option<RasterImage>> {
    let start = reader.position();
    let header = ChunkHeader::read(reader)?;
    let end = header.end(reader.position());

    if header.chunk_type != ChunkType::TextureNative {
        sink.report(
            Diagnostic::new(
                DiagnosticKind::ChunkMismatch {
                    expected: ChunkType::TextureNative,
                    found: header.chunk_type,
                },
                header.chunk_type,
                start,
            )
            .with_declared(header.length),
        );
        reader.seek(end);
        return Ok(None);
    }

    match read_texture_native(reader, &header, start, sink) {
        Ok(image) => Ok(image),
        Err(e) => {
            sink.report(
                Diagnostic::new(
                    DiagnosticKind::TextureFailed {
                        index,
                        reason: e.to_string(),
                    },
                    ChunkType::TextureNative,
                    start,
                )
                .with_declared(header.length),
            );
            reader.seek(end);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use rwkit_common::testing::{ChunkWriter, BUILD_3_6};

    use super::*;
    use crate::dxt::BlockFormat;
    use crate::native::{D3dFormat, PixelCodec, RasterFormat, PLATFORM_D3D8, PLATFORM_D3D9};

    /// Level 0 description for a synthetic entry.
    struct Entry<'a> {
        platform: u32,
        name: &'a str,
        mask: &'a str,
        raster_format: u32,
        d3d_format: D3dFormat,
        width: u16,
        height: u16,
        compression: u8,
        palette: &'a [[u8; 4]],
        level: &'a [u8],
        mips: &'a [&'a [u8]],
    }

    impl Default for Entry<'_> {
        fn default() -> Self {
            Self {
                platform: PLATFORM_D3D9,
                name: "tex",
                mask: "",
                raster_format: RasterFormat::FORMAT_8888,
                d3d_format: D3dFormat::A8R8G8B8,
                width: 1,
                height: 1,
                compression: 0,
                palette: &[],
                level: &[0, 0, 0, 255],
                mips: &[],
            }
        }
    }

    fn entry(w: &mut ChunkWriter, e: &Entry<'_>) {
        w.chunk(ChunkType::TextureNative, BUILD_3_6, |w| {
            w.struct_chunk(|w| {
                w.u32(e.platform)
                    .u32(0x1102)
                    .fixed_str(e.name, 32)
                    .fixed_str(e.mask, 32)
                    .u32(e.raster_format);
                if e.platform == PLATFORM_D3D8 {
                    w.u32(1);
                } else {
                    w.u32(e.d3d_format.0);
                }
                w.u16(e.width)
                    .u16(e.height)
                    .u8(32)
                    .u8(1 + e.mips.len() as u8)
                    .u8(4)
                    .u8(e.compression);
                for c in e.palette {
                    w.bytes(&[c[2], c[1], c[0], c[3]]);
                }
                w.u32(e.level.len() as u32).bytes(e.level);
                for mip in e.mips {
                    w.u32(mip.len() as u32).bytes(mip);
                }
            });
            w.empty_extension();
        });
    }

    fn dictionary(count: u16, entries: impl FnOnce(&mut ChunkWriter)) -> Vec<u8> {
        let mut w = ChunkWriter::new();
        w.chunk(ChunkType::TexDictionary, BUILD_3_6, |w| {
            w.struct_chunk(|w| {
                w.u16(count).u16(2);
            });
            entries(w);
            w.empty_extension();
        });
        w.finish()
    }

    fn parse(data: &[u8]) -> (TextureDictionary, Vec<Diagnostic>) {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let txd = TextureDictionary::parse(data, &mut diagnostics).unwrap();
        (txd, diagnostics)
    }

    #[test]
    fn test_raw_texture() {
        let data = dictionary(1, |w| {
            entry(
                w,
                &Entry {
                    name: "Wall",
                    mask: "wallA",
                    width: 2,
                    level: &[1, 2, 3, 4, 5, 6, 7, 8],
                    mips: &[&[9, 9, 9, 9]],
                    ..Entry::default()
                },
            );
        });
        let (txd, diagnostics) = parse(&data);

        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(txd.len(), 1);
        assert_eq!(txd.device_id(), 2);
        assert_eq!(txd.declared_count(), 1);

        let wall = txd.get("WALL").unwrap();
        assert_eq!(wall.name, "Wall");
        assert_eq!(wall.mask_name.as_deref(), Some("wallA"));
        assert_eq!(wall.dimensions(), (2, 1));
        assert!(wall.has_alpha);
        assert_eq!(wall.mip_levels, 2);
        assert_eq!(wall.filter_flags, 0x1102);
        assert_eq!(wall.rgba, vec![3, 2, 1, 4, 7, 6, 5, 8]);
        assert_eq!(wall.pixel(1, 0), Some([7, 6, 5, 8]));
        assert_eq!(wall.pixel(2, 0), None);
        assert!(txd.contains("wall"));
        assert_eq!(txd.names(), vec!["wall"]);
    }

    #[test]
    fn test_dxt_and_palette_entries() {
        let mut dxt1 = Vec::new();
        dxt1.extend_from_slice(&0xF800u16.to_le_bytes());
        dxt1.extend_from_slice(&0x001Fu16.to_le_bytes());
        dxt1.extend_from_slice(&[0; 4]);

        let data = dictionary(3, |w| {
            entry(
                w,
                &Entry {
                    name: "red",
                    d3d_format: D3dFormat::DXT1,
                    width: 4,
                    height: 4,
                    compression: 8,
                    level: &dxt1,
                    ..Entry::default()
                },
            );
            let mut palette = vec![[0, 0, 0, 0]; 256];
            palette[0] = [10, 20, 30, 40];
            palette[1] = [50, 60, 70, 80];
            entry(
                w,
                &Entry {
                    name: "pal",
                    raster_format: RasterFormat::FORMAT_8888 | RasterFormat::PAL8,
                    d3d_format: D3dFormat::P8,
                    width: 2,
                    palette: &palette,
                    level: &[1, 0],
                    ..Entry::default()
                },
            );
            entry(
                w,
                &Entry {
                    platform: PLATFORM_D3D8,
                    name: "old",
                    raster_format: RasterFormat::FORMAT_565,
                    level: &[0xFF, 0xFF],
                    ..Entry::default()
                },
            );
        });
        let (txd, diagnostics) = parse(&data);

        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(txd.len(), 3);

        let red = txd.get("red").unwrap();
        assert_eq!(red.codec, PixelCodec::Block(BlockFormat::Dxt1));
        assert!(!red.has_alpha);
        assert_eq!(red.rgba.len(), 64);
        assert!(red.rgba.chunks_exact(4).all(|p| p == [255, 0, 0, 255]));

        let pal = txd.get("PAL").unwrap();
        assert_eq!(pal.codec, PixelCodec::Palette8);
        assert_eq!(pal.rgba, vec![50, 60, 70, 80, 10, 20, 30, 40]);
        assert_eq!(pal.palette.as_ref().map(|p| p.len()), Some(256));

        let old = txd.get("old").unwrap();
        assert_eq!(old.platform, PLATFORM_D3D8);
        assert!(old.has_alpha);
        assert_eq!(old.d3d_format, D3dFormat::default());
        assert_eq!(old.rgba, vec![255, 255, 255, 255]);
    }

    #[test]
    fn test_unsupported_platform_and_duplicates() {
        let data = dictionary(4, |w| {
            entry(w, &Entry { name: "a", ..Entry::default() });
            entry(
                w,
                &Entry {
                    platform: 6,
                    name: "ps2",
                    ..Entry::default()
                },
            );
            entry(
                w,
                &Entry {
                    name: "A",
                    level: &[9, 9, 9, 9],
                    ..Entry::default()
                },
            );
            entry(w, &Entry { name: "b", ..Entry::default() });
        });
        let (txd, diagnostics) = parse(&data);

        assert_eq!(txd.len(), 2);
        assert_eq!(txd.get("a").map(|t| t.rgba.clone()), Some(vec![9, 9, 9, 9]));
        assert!(txd.get("ps2").is_none());
        assert!(txd.contains("b"));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnsupportedPlatform { platform: 6 });
        assert_eq!(
            diagnostics[1].kind,
            DiagnosticKind::DuplicateTexture {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn test_failed_entry_is_skipped() {
        let data = dictionary(2, |w| {
            // The struct claims a level far larger than the entry holds.
            w.chunk(ChunkType::TextureNative, BUILD_3_6, |w| {
                w.struct_chunk(|w| {
                    w.u32(PLATFORM_D3D9)
                        .u32(0)
                        .fixed_str("broken", 32)
                        .fixed_str("", 32)
                        .u32(RasterFormat::FORMAT_8888)
                        .u32(D3dFormat::A8R8G8B8.0)
                        .u16(1)
                        .u16(1)
                        .u8(32)
                        .u8(1)
                        .u8(4)
                        .u8(0)
                        .u32(0x10_0000);
                });
            });
            entry(w, &Entry { name: "ok", ..Entry::default() });
        });
        let (txd, diagnostics) = parse(&data);

        assert_eq!(txd.len(), 1);
        assert!(txd.contains("ok"));
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::TextureFailed { index: 0, .. }
        ));
    }

    #[test]
    fn test_oversized_dimensions_are_rejected() {
        let data = dictionary(2, |w| {
            entry(
                w,
                &Entry {
                    name: "huge",
                    width: u16::MAX,
                    height: u16::MAX,
                    level: &[],
                    ..Entry::default()
                },
            );
            entry(w, &Entry { name: "ok", ..Entry::default() });
        });
        let (txd, diagnostics) = parse(&data);

        assert_eq!(txd.names(), vec!["ok"]);
        assert_eq!(diagnostics.len(), 1);
        match &diagnostics[0].kind {
            DiagnosticKind::TextureFailed { index, reason } => {
                assert_eq!(*index, 0);
                assert!(reason.contains("65535x65535"), "{}", reason);
            }
            other => panic!("unexpected diagnostic {:?}", other),
        }
    }

    #[test]
    fn test_short_level_is_zero_padded() {
        let data = dictionary(1, |w| {
            entry(
                w,
                &Entry {
                    width: 2,
                    height: 2,
                    level: &[1, 2, 3, 4],
                    ..Entry::default()
                },
            );
        });
        let (txd, diagnostics) = parse(&data);

        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let tex = txd.get("tex").unwrap();
        assert_eq!(&tex.rgba[..4], &[3, 2, 1, 4]);
        assert_eq!(&tex.rgba[4..], &[0; 12]);
    }

    #[test]
    fn test_stray_chunk_and_truncated_count() {
        let data = dictionary(3, |w| {
            w.chunk(ChunkType::String, BUILD_3_6, |w| {
                w.fixed_str("x", 4);
            });
            entry(w, &Entry::default());
        });
        // Drop the dictionary's trailing extension so the third entry has
        // nothing to read.
        let data = &data[..data.len() - ChunkHeader::SIZE];
        let (txd, diagnostics) = parse(data);

        assert_eq!(txd.len(), 1);
        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::ChunkMismatch {
                expected: ChunkType::TextureNative,
                found: ChunkType::String
            }
        ));
        assert!(matches!(
            diagnostics[1].kind,
            DiagnosticKind::TextureFailed { index: 2, .. }
        ));
    }

    #[test]
    fn test_not_a_dictionary() {
        let mut w = ChunkWriter::new();
        w.chunk(ChunkType::Clump, BUILD_3_6, |w| {
            w.u32(0);
        });
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        let result = TextureDictionary::parse(&w.finish(), &mut diagnostics);
        assert!(matches!(
            result,
            Err(Error::NotATextureDictionary {
                found: ChunkType::Clump
            })
        ));

        let result = TextureDictionary::parse(&[0x16, 0, 0], &mut diagnostics);
        assert!(matches!(result, Err(Error::Common(_))));
    }
}
