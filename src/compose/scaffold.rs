// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scaffolds: coarse meshes whose faces are filled with patches

use super::patch::{Patch, DEFAULT_FIT_EPSILON};
use crate::config::KernelConfig;
use crate::error::{MeshError, Result};
use crate::geometry::{FaceId, HalfEdgeMesh, HalfedgeId, VertexId};
use crate::overlay::AttributedMesh;
use ahash::AHashSet;
use log::debug;
use nalgebra::Point3;
use slotmap::SecondaryMap;

/// A patch placed on one scaffold face
#[derive(Debug, Clone)]
struct Component {
    patch: Patch,
    /// Scaffold ring; side `i` is matched with patch segment `i`
    sides: Vec<HalfedgeId>,
}

/// Coarse mesh whose faces are placeholders for patches
#[derive(Debug, Clone)]
pub struct Scaffold {
    mesh: HalfEdgeMesh,
    components: SecondaryMap<FaceId, Component>,
    fit_epsilon: f64,
}

impl Scaffold {
    pub fn new(mesh: HalfEdgeMesh) -> Self {
        Self {
            mesh,
            components: SecondaryMap::new(),
            fit_epsilon: DEFAULT_FIT_EPSILON,
        }
    }

    pub fn with_config(mesh: HalfEdgeMesh, config: &KernelConfig) -> Self {
        Self {
            fit_epsilon: config.fit_epsilon,
            ..Self::new(mesh)
        }
    }

    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    pub fn has_component(&self, face: FaceId) -> bool {
        self.components.contains_key(face)
    }

    /// Place `patch` on `face`.
    ///
    /// The patch is fitted so that its corner `i` lands on the tail of the
    /// face's `i`-th ring half-edge, and its segment `i` is recorded against
    /// that half-edge.
    pub fn set_face_component(&mut self, face: FaceId, mut patch: Patch) -> Result<()> {
        self.mesh.ensure_face(face)?;
        let sides: Vec<HalfedgeId> = self.mesh.face_halfedges(face).collect();
        if patch.boundary_count() != sides.len() {
            return Err(MeshError::SegmentCountMismatch {
                expected: sides.len(),
                found: patch.boundary_count(),
            });
        }

        let targets: Vec<Point3<f64>> = sides
            .iter()
            .map(|&h| self.mesh.position(self.mesh.tail(h)))
            .collect();
        patch.set_fit_epsilon(self.fit_epsilon);
        patch.auto_adjust(&targets)?;
        self.components.insert(face, Component { patch, sides });
        Ok(())
    }

    /// Patch vertices standing in for a scaffold vertex, one per placed
    /// face corner, until `build` merges them
    pub fn patch_vertices(&self, vertex: VertexId) -> Vec<(FaceId, VertexId)> {
        let mut found = Vec::new();
        for (face, component) in &self.components {
            for (i, &side) in component.sides.iter().enumerate() {
                if self.mesh.tail(side) == vertex {
                    found.push((face, component.patch.corners()[i]));
                }
            }
        }
        found
    }

    /// Union every placed patch and weld the seams between neighbouring
    /// faces. Faces without a patch leave a hole.
    pub fn build(self) -> Result<AttributedMesh> {
        let Scaffold {
            mesh: scaffold,
            mut components,
            ..
        } = self;

        let mut result = AttributedMesh::new();
        let mut segments: SecondaryMap<FaceId, Vec<Vec<HalfedgeId>>> = SecondaryMap::new();
        let mut sides: SecondaryMap<FaceId, Vec<HalfedgeId>> = SecondaryMap::new();
        for face in scaffold.face_ids() {
            let Some(Component { patch, sides: ring }) = components.remove(face) else {
                continue;
            };
            let (mesh, local) = patch.into_parts();
            let map = result.combine(mesh);
            let translated = local
                .iter()
                .map(|segment| {
                    segment
                        .iter()
                        .map(|&h| {
                            map.halfedge(h).ok_or_else(|| {
                                MeshError::CorruptTopology(
                                    "patch segment refers to a removed half-edge".to_string(),
                                )
                            })
                        })
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()?;
            segments.insert(face, translated);
            sides.insert(face, ring);
        }

        let mut seams = 0;
        let mut done: AHashSet<HalfedgeId> = AHashSet::new();
        for h in scaffold.halfedge_ids() {
            let o = scaffold.opposite(h);
            if done.contains(&o) {
                continue;
            }
            done.insert(h);
            let (Some(a), Some(b)) = (scaffold.halfedge_face(h), scaffold.halfedge_face(o)) else {
                continue;
            };
            let (Some(side_a), Some(side_b)) = (
                position_in(&sides, a, h),
                position_in(&sides, b, o),
            ) else {
                continue;
            };

            let seam_a = &segments[a][side_a];
            let seam_b = &segments[b][side_b];
            if seam_a.len() != seam_b.len() {
                return Err(MeshError::SegmentCountMismatch {
                    expected: seam_a.len(),
                    found: seam_b.len(),
                });
            }
            // Neighbours run along a shared side in opposite directions
            for (&e1, &e2) in seam_a.iter().zip(seam_b.iter().rev()) {
                result.connect_edges(e1, e2)?;
            }
            seams += 1;
        }

        debug!(
            "build: welded {seams} seams, {} vertices, {} faces",
            result.mesh().vertex_count(),
            result.mesh().face_count()
        );
        Ok(result)
    }
}

fn position_in(
    sides: &SecondaryMap<FaceId, Vec<HalfedgeId>>,
    face: FaceId,
    h: HalfedgeId,
) -> Option<usize> {
    sides.get(face)?.iter().position(|&side| side == h)
}
