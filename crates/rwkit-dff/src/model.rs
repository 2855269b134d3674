//! Render-ready view of a decoded clump.

use rwkit_common::{ChunkType, Diagnostic, DiagnosticKind, DiagnosticSink};

use crate::assembly::{assemble, AssembledMesh, SkinAttributes};
use crate::clump::Clump;
use crate::error::SkeletonError;
use crate::skeleton::{resolve_skeleton, Skeleton};

/// One atomic with its geometry assembled.
#[derive(Debug, Clone)]
pub struct ModelPart {
    /// Index into [`Clump::atomics`].
    pub atomic: usize,
    pub frame: usize,
    pub geometry: usize,
    pub mesh: AssembledMesh,
    /// Bone influences per output vertex, for skinned geometry.
    pub skin: Option<SkinAttributes>,
    pub skeleton: Option<Skeleton>,
}

impl ModelPart {
    pub fn is_skinned(&self) -> bool {
        self.skin.is_some() && self.skeleton.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    pub parts: Vec<ModelPart>,
}

impl Model {
    /// Assemble every atomic of `clump`.
    ///
    /// Atomics whose geometry is missing or cannot be assembled are left out
    /// and reported. A skeleton that cannot be resolved is reported and the
    /// parts are built without one.
    pub fn build(clump: &Clump, sink: &mut dyn DiagnosticSink) -> Self {
        let skeleton = match resolve_skeleton(&clump.frames) {
            Ok(skeleton) => skeleton,
            Err(SkeletonError::Unresolved {
                descriptor,
                node_id,
            }) => {
                sink.report(Diagnostic::new(
                    DiagnosticKind::SkeletonUnresolved {
                        descriptor,
                        node_id,
                    },
                    ChunkType::FrameList,
                    clump.frames.offset(),
                ));
                None
            }
        };

        let mut parts = Vec::with_capacity(clump.atomics.len());
        for (index, atomic) in clump.atomics.iter().enumerate() {
            let geometry_index = atomic.geometry_index as usize;
            let Some(geometry) = clump.geometries.get(geometry_index) else {
                sink.report(Diagnostic::new(
                    DiagnosticKind::AssemblyFailed {
                        geometry: geometry_index,
                        reason: "geometry missing".to_string(),
                    },
                    ChunkType::Atomic,
                    atomic.offset,
                ));
                continue;
            };

            let mesh = match assemble(geometry) {
                Ok(mesh) => mesh,
                Err(e) => {
                    sink.report(Diagnostic::new(
                        DiagnosticKind::AssemblyFailed {
                            geometry: geometry_index,
                            reason: e.to_string(),
                        },
                        ChunkType::Geometry,
                        geometry.offset,
                    ));
                    continue;
                }
            };

            let skin = geometry.skin().map(|skin| mesh.skin_attributes(skin));

            parts.push(ModelPart {
                atomic: index,
                frame: atomic.frame_index as usize,
                geometry: geometry_index,
                mesh,
                skin,
                skeleton: skeleton.clone(),
            });
        }

        tracing::debug!(parts = parts.len(), skinned = skeleton.is_some(), "model built");

        Self { parts }
    }

    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.vertex_count()).sum()
    }
}
