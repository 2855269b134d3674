//! Binding a logical HAnim skeleton onto the frame tree.
//!
//! One frame (the anchor) declares the skeleton as an ordered list of node
//! ids. Each frame that takes part carries its own node id. Resolution maps
//! every declared node, in order, to a distinct frame.

use crate::error::SkeletonError;
use crate::frame::FrameList;

/// One resolved bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bone {
    pub node_id: u32,
    /// Index of the node in the animation hierarchy.
    pub node_index: u32,
    pub flags: u32,
    /// The frame the node is bound to.
    pub frame: usize,
}

/// A logical skeleton bound to frames, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    /// The frame that declares the skeleton.
    pub anchor: usize,
    pub bones: Vec<Bone>,
}

impl Skeleton {
    /// Frame indices in bone order.
    pub fn frames(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones.iter().map(|b| b.frame)
    }
}

/// Resolve the skeleton declared in `frames`.
///
/// The anchor is the first frame, in list order, whose HAnim plugin carries
/// a non-empty node list; node lists on later frames are ignored. Returns
/// `Ok(None)` when no frame declares one.
pub fn resolve_skeleton(frames: &FrameList) -> Result<Option<Skeleton>, SkeletonError> {
    let Some((anchor, nodes)) = frames
        .iter()
        .enumerate()
        .find_map(|(i, f)| f.hanim().map(|h| (i, h.nodes())).filter(|(_, n)| !n.is_empty()))
    else {
        return Ok(None);
    };

    let mut bound = vec![false; frames.len()];
    let mut bones = Vec::with_capacity(nodes.len());
    let mut stack = Vec::new();

    for (descriptor, node) in nodes.iter().enumerate() {
        let mut visited = vec![false; frames.len()];
        let frame = (anchor..frames.len())
            .find_map(|root| {
                find_unbound(frames, root, node.node_id, &bound, &mut visited, &mut stack)
            })
            .ok_or(SkeletonError::Unresolved {
                descriptor,
                node_id: node.node_id,
            })?;

        bound[frame] = true;
        bones.push(Bone {
            node_id: node.node_id,
            node_index: node.node_index,
            flags: node.flags,
            frame,
        });
    }

    Ok(Some(Skeleton { anchor, bones }))
}

/// Pre-order search below `root` for an unbound frame with `node_id`.
///
/// Children are visited in stream order. The walk keeps its own stack so
/// deep parent chains cannot exhaust the thread stack.
fn find_unbound(
    frames: &FrameList,
    root: usize,
    node_id: u32,
    bound: &[bool],
    visited: &mut [bool],
    stack: &mut Vec<usize>,
) -> Option<usize> {
    stack.clear();
    stack.push(root);

    while let Some(index) = stack.pop() {
        if visited[index] {
            continue;
        }
        visited[index] = true;

        let frame = &frames[index];
        if !bound[index] && frame.hanim().is_some_and(|h| h.node_id == node_id) {
            return Some(index);
        }
        stack.extend(frame.children.iter().rev());
    }

    None
}
