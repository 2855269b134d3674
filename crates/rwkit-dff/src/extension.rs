//! Extension chunks and the plugin map.
//!
//! An Extension is a length-bounded run of plugin sub-chunks trailing almost
//! every structural chunk. Each owner keeps at most one payload per plugin
//! kind.

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use rwkit_common::{
    close_chunk, read_chunk, BinaryReader, ChunkHeader, ChunkType, Diagnostic, DiagnosticKind,
    DiagnosticSink,
};

use crate::plugins::{BinMesh, HAnim, MeshExtension, Skin};
use crate::Result;

type FxHashMap<K, V> = FastHashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// The chunk an Extension trails.
///
/// Plugins that depend on their owner (Skin needs the vertex count) read it
/// from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionOwner {
    Clump,
    Frame,
    Geometry { vertex_count: usize },
    Material,
    Texture,
    Atomic,
}

impl ExtensionOwner {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clump => "Clump",
            Self::Frame => "Frame",
            Self::Geometry { .. } => "Geometry",
            Self::Material => "Material",
            Self::Texture => "Texture",
            Self::Atomic => "Atomic",
        }
    }
}

/// Plugin kinds the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    HAnim,
    BinMesh,
    Skin,
    MeshExtension,
    FrameName,
}

impl PluginKind {
    pub const fn from_chunk_type(chunk_type: ChunkType) -> Option<Self> {
        match chunk_type {
            ChunkType::HAnim => Some(Self::HAnim),
            ChunkType::BinMesh => Some(Self::BinMesh),
            ChunkType::Skin => Some(Self::Skin),
            ChunkType::MeshExtension => Some(Self::MeshExtension),
            ChunkType::FrameName => Some(Self::FrameName),
            _ => None,
        }
    }

    pub const fn chunk_type(self) -> ChunkType {
        match self {
            Self::HAnim => ChunkType::HAnim,
            Self::BinMesh => ChunkType::BinMesh,
            Self::Skin => ChunkType::Skin,
            Self::MeshExtension => ChunkType::MeshExtension,
            Self::FrameName => ChunkType::FrameName,
        }
    }
}

/// A decoded plugin payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Plugin {
    HAnim(HAnim),
    BinMesh(BinMesh),
    Skin(Skin),
    MeshExtension(MeshExtension),
    FrameName(String),
}

impl Plugin {
    pub fn kind(&self) -> PluginKind {
        match self {
            Self::HAnim(_) => PluginKind::HAnim,
            Self::BinMesh(_) => PluginKind::BinMesh,
            Self::Skin(_) => PluginKind::Skin,
            Self::MeshExtension(_) => PluginKind::MeshExtension,
            Self::FrameName(_) => PluginKind::FrameName,
        }
    }
}

/// Plugins attached to one owner, keyed by kind.
#[derive(Debug, Clone, Default)]
pub struct Extension {
    plugins: FxHashMap<PluginKind, Plugin>,
}

impl Extension {
    /// Read the Extension chunk at the cursor.
    ///
    /// A missing Extension (some other chunk in its place) is reported and
    /// yields an empty map.
    pub(crate) fn read(
        reader: &mut BinaryReader<'_>,
        owner: ExtensionOwner,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self> {
        let extension = read_chunk(reader, ChunkType::Extension, sink, |reader, header, sink| {
            Self::read_body(reader, header, owner, sink)
        })?;
        Ok(extension.unwrap_or_default())
    }

    fn read_body(
        reader: &mut BinaryReader<'_>,
        header: &ChunkHeader,
        owner: ExtensionOwner,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self> {
        let end = header.end(reader.position());
        let mut extension = Self::default();

        while reader.position() < end {
            let start = reader.position();
            let sub = ChunkHeader::read(reader)?;
            let body_start = reader.position();
            let sub_end = sub.end(body_start);

            let plugin = match PluginKind::from_chunk_type(sub.chunk_type) {
                Some(PluginKind::HAnim) => Some(Plugin::HAnim(HAnim::read(reader)?)),
                Some(PluginKind::FrameName) => Some(Plugin::FrameName(
                    reader.read_fixed_string(sub.length as usize)?,
                )),
                Some(PluginKind::BinMesh) => Some(Plugin::BinMesh(BinMesh::read(reader, &sub)?)),
                Some(PluginKind::Skin) => match owner {
                    ExtensionOwner::Geometry { vertex_count } => {
                        Some(Plugin::Skin(Skin::read(reader, vertex_count)?))
                    }
                    other => {
                        sink.report(
                            Diagnostic::new(
                                DiagnosticKind::UnexpectedPlugin {
                                    owner: other.name(),
                                },
                                sub.chunk_type,
                                start,
                            )
                            .with_declared(sub.length),
                        );
                        reader.seek(sub_end);
                        None
                    }
                },
                Some(PluginKind::MeshExtension) => {
                    let magic = reader.read_u32()?;
                    if magic != 0 {
                        sink.report(
                            Diagnostic::new(DiagnosticKind::NotImplemented, sub.chunk_type, start)
                                .with_declared(sub.length),
                        );
                        reader.seek(sub_end);
                    }
                    Some(Plugin::MeshExtension(MeshExtension { magic }))
                }
                None => {
                    reader.seek(sub_end);
                    None
                }
            };

            close_chunk(reader, &sub, body_start, sink)?;

            if let Some(plugin) = plugin {
                if extension.insert(plugin).is_some() {
                    sink.report(Diagnostic::new(
                        DiagnosticKind::DuplicateExtension,
                        sub.chunk_type,
                        start,
                    ));
                }
            }
        }

        Ok(extension)
    }

    /// Insert a plugin, returning the payload it replaced.
    pub fn insert(&mut self, plugin: Plugin) -> Option<Plugin> {
        self.plugins.insert(plugin.kind(), plugin)
    }

    pub fn get(&self, kind: PluginKind) -> Option<&Plugin> {
        self.plugins.get(&kind)
    }

    pub fn contains(&self, kind: PluginKind) -> bool {
        self.plugins.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Iterate over the plugins in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.values()
    }

    pub fn hanim(&self) -> Option<&HAnim> {
        match self.get(PluginKind::HAnim) {
            Some(Plugin::HAnim(hanim)) => Some(hanim),
            _ => None,
        }
    }

    pub fn bin_mesh(&self) -> Option<&BinMesh> {
        match self.get(PluginKind::BinMesh) {
            Some(Plugin::BinMesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn skin(&self) -> Option<&Skin> {
        match self.get(PluginKind::Skin) {
            Some(Plugin::Skin(skin)) => Some(skin),
            _ => None,
        }
    }

    pub fn mesh_extension(&self) -> Option<&MeshExtension> {
        match self.get(PluginKind::MeshExtension) {
            Some(Plugin::MeshExtension(ext)) => Some(ext),
            _ => None,
        }
    }

    pub fn frame_name(&self) -> Option<&str> {
        match self.get(PluginKind::FrameName) {
            Some(Plugin::FrameName(name)) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rwkit_common::testing::{ChunkWriter, BUILD_3_6};
    use rwkit_common::Error as CommonError;

    use super::*;
    use crate::Error;

    fn extension(body: impl FnOnce(&mut ChunkWriter)) -> Vec<u8> {
        ChunkWriter::new()
            .chunk(ChunkType::Extension, BUILD_3_6, body)
            .finish()
    }

    fn hanim_leaf(w: &mut ChunkWriter, node_id: u32) {
        w.chunk(ChunkType::HAnim, BUILD_3_6, |w| {
            w.u32(0x100).u32(node_id).u32(0);
        });
    }

    #[test]
    fn test_frame_name_and_hanim() {
        let data = extension(|w| {
            w.chunk(ChunkType::FrameName, BUILD_3_6, |w| {
                w.bytes(b"Pelvis\0\0");
            });
            hanim_leaf(w, 3);
        });

        let mut reader = BinaryReader::new(&data);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let ext = Extension::read(&mut reader, ExtensionOwner::Frame, &mut diagnostics).unwrap();

        assert!(reader.is_empty());
        assert!(diagnostics.is_empty());
        assert_eq!(ext.len(), 2);
        assert_eq!(ext.frame_name(), Some("Pelvis"));
        assert_eq!(ext.hanim().map(|h| h.node_id), Some(3));
    }

    #[test]
    fn test_unknown_plugin_skipped_silently() {
        let data = extension(|w| {
            w.raw_chunk(0x0253_F2F3, 4, BUILD_3_6, &[1, 2, 3, 4]);
            w.chunk(ChunkType::MaterialEffects, BUILD_3_6, |w| {
                w.u32(0).u32(0);
            });
        });

        let mut reader = BinaryReader::new(&data);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let ext = Extension::read(&mut reader, ExtensionOwner::Material, &mut diagnostics).unwrap();

        assert!(reader.is_empty());
        assert!(diagnostics.is_empty());
        assert!(ext.is_empty());
    }

    #[test]
    fn test_duplicate_plugin_later_wins() {
        let data = extension(|w| {
            hanim_leaf(w, 1);
            hanim_leaf(w, 2);
        });

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let ext = Extension::read(
            &mut BinaryReader::new(&data),
            ExtensionOwner::Frame,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(ext.hanim().map(|h| h.node_id), Some(2));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DuplicateExtension);
        assert_eq!(diagnostics[0].chunk, ChunkType::HAnim);
    }

    #[test]
    fn test_skin_outside_geometry_is_skipped() {
        let data = extension(|w| {
            w.chunk(ChunkType::Skin, BUILD_3_6, |w| {
                w.u8(1).u8(0).u8(1).u8(0).bytes(&[0; 20]);
            });
        });

        let mut reader = BinaryReader::new(&data);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let ext = Extension::read(&mut reader, ExtensionOwner::Atomic, &mut diagnostics).unwrap();

        assert!(reader.is_empty());
        assert!(ext.skin().is_none());
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::UnexpectedPlugin { owner: "Atomic" }
        );
    }

    #[test]
    fn test_skin_sized_by_owner_vertex_count() {
        let data = extension(|w| {
            w.chunk(ChunkType::Skin, BUILD_3_6, |w| {
                w.u8(0).u8(0).u8(1).u8(0);
                w.bytes(&[0, 0, 0, 0]).bytes(&[1, 0, 0, 0]).bytes(&[2, 0, 0, 0]);
                for _ in 0..3 {
                    w.f32s(&[1.0, 0.0, 0.0, 0.0]);
                }
            });
        });

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let ext = Extension::read(
            &mut BinaryReader::new(&data),
            ExtensionOwner::Geometry { vertex_count: 3 },
            &mut diagnostics,
        )
        .unwrap();

        let skin = ext.skin().unwrap();
        assert_eq!(skin.bone_indices.len(), 3);
        assert_eq!(skin.bone_indices[2], [2, 0, 0, 0]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_mesh_extension_variants() {
        let empty = extension(|w| {
            w.chunk(ChunkType::MeshExtension, BUILD_3_6, |w| {
                w.u32(0);
            });
        });
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let ext = Extension::read(
            &mut BinaryReader::new(&empty),
            ExtensionOwner::Geometry { vertex_count: 0 },
            &mut diagnostics,
        )
        .unwrap();
        assert!(ext.mesh_extension().unwrap().is_empty());
        assert!(diagnostics.is_empty());

        let populated = extension(|w| {
            w.chunk(ChunkType::MeshExtension, BUILD_3_6, |w| {
                w.u32(1).bytes(&[0xAB; 16]);
            });
        });
        let mut reader = BinaryReader::new(&populated);
        let ext = Extension::read(
            &mut reader,
            ExtensionOwner::Geometry { vertex_count: 0 },
            &mut diagnostics,
        )
        .unwrap();
        assert!(reader.is_empty());
        assert_eq!(ext.mesh_extension().map(|m| m.magic), Some(1));
        assert_eq!(diagnostics[0].kind, DiagnosticKind::NotImplemented);
    }

    #[test]
    fn test_short_plugin_read_is_padded_over() {
        let data = extension(|w| {
            w.chunk(ChunkType::HAnim, BUILD_3_6, |w| {
                w.u32(0x100).u32(4).u32(0).u32(0);
            });
        });

        let mut reader = BinaryReader::new(&data);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let ext = Extension::read(&mut reader, ExtensionOwner::Frame, &mut diagnostics).unwrap();

        assert!(reader.is_empty());
        assert_eq!(ext.hanim().map(|h| h.node_id), Some(4));
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnderConsumption);
        assert_eq!(diagnostics[0].consumed, Some(12));
    }

    #[test]
    fn test_plugin_overrun_is_fatal() {
        let data = extension(|w| {
            w.raw_chunk(ChunkType::HAnim.raw(), 8, BUILD_3_6, &[0; 12]);
        });

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let result = Extension::read(
            &mut BinaryReader::new(&data),
            ExtensionOwner::Frame,
            &mut diagnostics,
        );

        assert!(matches!(
            result,
            Err(Error::Common(CommonError::ChunkOverrun {
                chunk: ChunkType::HAnim,
                declared: 8,
                consumed: 12,
                ..
            }))
        ));
    }

    #[test]
    fn test_missing_extension_yields_empty_map() {
        let data = ChunkWriter::new().struct_chunk(|w| {
            w.u32(0);
        }).finish();

        let mut reader = BinaryReader::new(&data);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let ext = Extension::read(&mut reader, ExtensionOwner::Clump, &mut diagnostics).unwrap();

        assert!(ext.is_empty());
        assert!(reader.is_empty());
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::ChunkMismatch {
                expected: ChunkType::Extension,
                found: ChunkType::Struct
            }
        ));
    }
}
