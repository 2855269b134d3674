//! Frame list: the transform hierarchy.
//!
//! Frames are stored flat, in stream order. Each frame names its parent by
//! index, so the forest is built while the records are read: every frame is
//! appended to its parent's child list as soon as it is seen.

use rwkit_common::{
    read_chunk, BinaryReader, ChunkHeader, ChunkType, Diagnostic, DiagnosticKind, DiagnosticSink,
};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::extension::{Extension, ExtensionOwner};
use crate::plugins::HAnim;
use crate::Result;

/// On-disk frame record (56 bytes).
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
struct RawFrame {
    rotation: [f32; 9],
    position: [f32; 3],
    parent: i32,
    flags: u32,
}

const _: () = assert!(std::mem::size_of::<RawFrame>() == 56);

/// One node of the transform hierarchy.
#[derive(Debug, Clone)]
pub struct Frame {
    /// 3x3 rotation basis, row by row as stored.
    pub rotation: [f32; 9],
    /// Translation relative to the parent.
    pub position: [f32; 3],
    /// Parent index as stored; negative for roots.
    pub parent_index: i32,
    pub flags: u32,
    /// Children in stream order.
    pub children: Vec<usize>,
    pub extension: Extension,
}

impl Frame {
    /// The parent frame, if the stored index names an earlier frame.
    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.parent_index).ok()
    }

    /// Name from the frame-name plugin.
    pub fn name(&self) -> Option<&str> {
        self.extension.frame_name()
    }

    pub fn hanim(&self) -> Option<&HAnim> {
        self.extension.hanim()
    }

    /// Local transform as a column-major 4x4 matrix.
    pub fn local_matrix(&self) -> [f32; 16] {
        let r = &self.rotation;
        let p = &self.position;
        [
            r[0], r[1], r[2], 0.0, //
            r[3], r[4], r[5], 0.0, //
            r[6], r[7], r[8], 0.0, //
            p[0], p[1], p[2], 1.0,
        ]
    }
}

/// All frames of a clump.
#[derive(Debug, Clone, Default)]
pub struct FrameList {
    frames: Vec<Frame>,
    offset: usize,
}

impl FrameList {
    pub(crate) fn read(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Option<Self>> {
        read_chunk(reader, ChunkType::FrameList, sink, |reader, _, sink| {
            Self::read_body(reader, sink)
        })
    }

    fn read_body(reader: &mut BinaryReader<'_>, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let offset = reader.position().saturating_sub(ChunkHeader::SIZE);
        let _struct_header = ChunkHeader::read(reader)?;
        let count = reader.read_u32()? as usize;

        let mut frames: Vec<Frame> = Vec::with_capacity(reader.capacity_for(count, 56));
        for index in 0..count {
            let record_start = reader.position();
            let raw: RawFrame = reader.read_struct()?;

            let mut parent_index = raw.parent;
            match usize::try_from(raw.parent) {
                Ok(parent) if parent < index => frames[parent].children.push(index),
                Ok(_) => {
                    sink.report(Diagnostic::new(
                        DiagnosticKind::InvalidFrameParent {
                            frame: index,
                            parent: raw.parent,
                        },
                        ChunkType::FrameList,
                        record_start,
                    ));
                    parent_index = -1;
                }
                Err(_) => {}
            }

            frames.push(Frame {
                rotation: raw.rotation,
                position: raw.position,
                parent_index,
                flags: raw.flags,
                children: Vec::new(),
                extension: Extension::default(),
            });
        }

        for frame in &mut frames {
            frame.extension = Extension::read(reader, ExtensionOwner::Frame, sink)?;
        }

        Ok(Self { frames, offset })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Byte offset of the FrameList chunk header.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn as_slice(&self) -> &[Frame] {
        &self.frames
    }

    /// Indices of frames without a parent.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame.parent().is_none())
            .map(|(index, _)| index)
    }

    /// Children of `index`, empty if the index is out of range.
    pub fn children(&self, index: usize) -> &[usize] {
        self.frames.get(index).map_or(&[], |f| f.children.as_slice())
    }

    /// Transform of `index` relative to its root, column-major.
    pub fn world_matrix(&self, index: usize) -> Option<[f32; 16]> {
        let mut frame = self.frames.get(index)?;
        let mut world = frame.local_matrix();
        // Parents always precede their children, so the walk terminates.
        while let Some(parent) = frame.parent() {
            frame = self.frames.get(parent)?;
            world = multiply(&frame.local_matrix(), &world);
        }
        Some(world)
    }
}

impl<'a> IntoIterator for &'a FrameList {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl std::ops::Index<usize> for FrameList {
    type Output = Frame;

    fn index(&self, index: usize) -> &Frame {
        &self.frames[index]
    }
}

fn multiply(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
        }
    }
    out
}
