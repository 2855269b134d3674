//! Clump: the root of a DFF scene archive.

use rwkit_common::{read_chunk, BinaryReader, ChunkHeader, ChunkType, DiagnosticSink};

use crate::extension::{Extension, ExtensionOwner};
use crate::frame::FrameList;
use crate::geometry::{Geometry, GeometryList};
use crate::Result;

/// Binds one frame to one geometry.
#[derive(Debug, Clone)]
pub struct Atomic {
    /// Byte offset of the Atomic chunk header.
    pub offset: usize,
    pub frame_index: u32,
    pub geometry_index: u32,
    pub flags: u32,
    pub extension: Extension,
}

impl Atomic {
    fn read(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Option<Self>> {
        read_chunk(reader, ChunkType::Atomic, sink, |reader, _, sink| {
            Self::read_body(reader, sink)
        })
    }

    fn read_body(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let offset = reader.position().saturating_sub(ChunkHeader::SIZE);
        let _struct_header = ChunkHeader::read(reader)?;
        let frame_index = reader.read_u32()?;
        let geometry_index = reader.read_u32()?;
        let flags = reader.read_u32()?;
        let _reserved = reader.read_u32()?;
        let extension = Extension::read(reader, ExtensionOwner::Atomic, sink)?;

        Ok(Self {
            offset,
            frame_index,
            geometry_index,
            flags,
            extension,
        })
    }
}

/// A decoded scene archive.
#[derive(Debug, Clone, Default)]
pub struct Clump {
    pub frames: FrameList,
    pub geometries: GeometryList,
    pub atomics: Vec<Atomic>,
    /// Light count, when the struct records one.
    pub light_count: Option<u32>,
    /// Camera count, when the struct records one.
    pub camera_count: Option<u32>,
    pub extension: Extension,
}

impl Clump {
    /// Scan `data` for the first Clump and decode it.
    ///
    /// Chunks ahead of the Clump are skipped without diagnostics. Returns
    /// `Ok(None)` when the stream ends first.
    pub fn parse(data: &[u8], sink: &mut dyn DiagnosticSink) -> Result<Option<Self>> {
        let mut reader = BinaryReader::new(data);

        while reader.remaining() >= ChunkHeader::SIZE {
            let clump = read_chunk(&mut reader, ChunkType::Clump, sink, |reader, _, sink| {
                Self::read_body(reader, sink)
            })?;
            if clump.is_some() {
                return Ok(clump);
            }
        }

        Ok(None)
    }

    fn read_body(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let header = ChunkHeader::read(reader)?;
        let atomic_count = reader.read_u32()?;

        let (light_count, camera_count) = if header.length == 12 {
            (Some(reader.read_u32()?), Some(reader.read_u32()?))
        } else {
            (None, None)
        };

        let frames = FrameList::read(reader, sink)?.unwrap_or_default();
        let geometries = GeometryList::read(reader, sink)?.unwrap_or_default();

        let mut atomics = Vec::with_capacity(reader.capacity_for(atomic_count as usize, ChunkHeader::SIZE));
        for _ in 0..atomic_count {
            if let Some(atomic) = Atomic::read(reader, sink)? {
                atomics.push(atomic);
            }
        }

        let extension = Extension::read(reader, ExtensionOwner::Clump, sink)?;

        tracing::debug!(
            frames = frames.len(),
            geometries = geometries.len(),
            atomics = atomics.len(),
            "clump decoded"
        );

        Ok(Self {
            frames,
            geometries,
            atomics,
            light_count,
            camera_count,
            extension,
        })
    }

    /// The geometry an atomic draws.
    pub fn geometry_of(&self, atomic: &Atomic) -> Option<&Geometry> {
        self.geometries.get(atomic.geometry_index as usize)
    }
}

#[cfg(test)]
mod tests {
    use rwkit_common::testing::{ChunkWriter, BUILD_3_6};
    use rwkit_common::{Diagnostic, DiagnosticKind, Error as CommonError};

    use super::*;
    use crate::fixtures::{self, MeshData};
    use crate::Error;

    fn simple_clump(w: &mut ChunkWriter) {
        fixtures::clump(
            w,
            |w| fixtures::frame_list(w, &[-1, 0], &[], None),
            |w| {
                let mut mesh = MeshData::line(3);
                mesh.triangles = vec![[0, 1, 0, 2]];
                fixtures::geometry(w, &mesh, |_| {});
                1
            },
        );
    }

    #[test]
    fn test_parse_clump() {
        let mut w = ChunkWriter::new();
        simple_clump(&mut w);
        let data = w.finish();

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let clump = Clump::parse(&data, &mut diagnostics).unwrap().unwrap();

        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(clump.frames.len(), 2);
        assert_eq!(clump.geometries.len(), 1);
        assert_eq!(clump.atomics.len(), 1);
        assert_eq!(clump.light_count, Some(0));
        assert_eq!(clump.camera_count, Some(0));

        let atomic = &clump.atomics[0];
        assert_eq!(atomic.frame_index, 0);
        assert_eq!(atomic.flags, 5);
        assert_eq!(clump.geometry_of(atomic).map(|g| g.triangles.len()), Some(1));
    }

    #[test]
    fn test_leading_chunks_skipped_silently() {
        let mut w = ChunkWriter::new();
        w.chunk(ChunkType::Unknown(0x0253_F2F8), BUILD_3_6, |w| {
            w.bytes(&[0; 20]);
        });
        simple_clump(&mut w);
        let data = w.finish();

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let clump = Clump::parse(&data, &mut diagnostics).unwrap();

        assert!(clump.is_some());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_no_clump_returns_none() {
        let mut w = ChunkWriter::new();
        w.chunk(ChunkType::TexDictionary, BUILD_3_6, |w| {
            w.u32(0);
        });
        w.bytes(&[0; 7]);
        let data = w.finish();

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        assert!(Clump::parse(&data, &mut diagnostics).unwrap().is_none());
        assert!(Clump::parse(&[], &mut diagnostics).unwrap().is_none());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_old_clump_struct_has_no_light_counts() {
        let mut w = ChunkWriter::new();
        w.chunk(ChunkType::Clump, BUILD_3_6, |w| {
            w.struct_chunk(|w| {
                w.u32(0);
            });
            fixtures::frame_list(w, &[-1], &[], None);
            w.chunk(ChunkType::GeometryList, BUILD_3_6, |w| {
                w.struct_chunk(|w| {
                    w.u32(0);
                });
            });
            w.empty_extension();
        });
        let data = w.finish();

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let clump = Clump::parse(&data, &mut diagnostics).unwrap().unwrap();

        assert_eq!(clump.light_count, None);
        assert!(clump.atomics.is_empty());
        assert_eq!(clump.frames.len(), 1);
    }

    #[test]
    fn test_trailing_padding_reported() {
        let mut w = ChunkWriter::new();
        w.chunk(ChunkType::Clump, BUILD_3_6, |w| {
            w.struct_chunk(|w| {
                w.u32(0);
            });
            fixtures::frame_list(w, &[-1], &[], None);
            w.chunk(ChunkType::GeometryList, BUILD_3_6, |w| {
                w.struct_chunk(|w| {
                    w.u32(0);
                });
            });
            w.empty_extension();
            w.bytes(&[0; 8]);
        });
        let data = w.finish();

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        Clump::parse(&data, &mut diagnostics).unwrap().unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnderConsumption);
        assert_eq!(diagnostics[0].chunk, ChunkType::Clump);
        assert_eq!(diagnostics[0].declared.zip(diagnostics[0].consumed).map(|(d, c)| d as usize - c), Some(8));
    }

    #[test]
    fn test_truncated_stream_is_a_bounds_error() {
        let mut w = ChunkWriter::new();
        simple_clump(&mut w);
        let mut data = w.finish();
        data.truncate(data.len() / 2);

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let result = Clump::parse(&data, &mut diagnostics);

        assert!(matches!(
            result,
            Err(Error::Common(CommonError::UnexpectedEof { .. }))
        ));
    }
}
