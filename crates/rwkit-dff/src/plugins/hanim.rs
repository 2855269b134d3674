//! Hierarchical animation (HAnim) plugin.
//!
//! Every animated frame carries an HAnim plugin naming its logical node id.
//! The root of a skeleton additionally lists every node of the hierarchy in
//! the order animations address them.

use rwkit_common::BinaryReader;

use crate::Result;

/// One node of a logical skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HAnimNode {
    /// Logical node id, matched against frames' own [`HAnim::node_id`].
    pub node_id: u32,
    /// Index of the node in the animation hierarchy.
    pub node_index: u32,
    /// Hierarchy flags (push/pop markers).
    pub flags: u32,
}

/// The node list declared by a skeleton root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HAnimHierarchy {
    pub flags: u32,
    pub key_frame_size: u32,
    pub nodes: Vec<HAnimNode>,
}

/// HAnim plugin payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HAnim {
    pub version: u32,
    /// This frame's logical node id.
    pub node_id: u32,
    /// Present only on the frame that declares the skeleton.
    pub hierarchy: Option<HAnimHierarchy>,
}

impl HAnim {
    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let version = reader.read_u32()?;
        let node_id = reader.read_u32()?;
        let node_count = reader.read_u32()? as usize;

        let hierarchy = if node_count > 0 {
            let flags = reader.read_u32()?;
            let key_frame_size = reader.read_u32()?;
            let mut nodes = Vec::with_capacity(reader.capacity_for(node_count, 12));
            for _ in 0..node_count {
                nodes.push(HAnimNode {
                    node_id: reader.read_u32()?,
                    node_index: reader.read_u32()?,
                    flags: reader.read_u32()?,
                });
            }
            Some(HAnimHierarchy {
                flags,
                key_frame_size,
                nodes,
            })
        } else {
            None
        };

        Ok(Self {
            version,
            node_id,
            hierarchy,
        })
    }

    /// The declared skeleton nodes, empty unless this frame is a skeleton root.
    pub fn nodes(&self) -> &[HAnimNode] {
        self.hierarchy.as_ref().map_or(&[], |h| h.nodes.as_slice())
    }
}
