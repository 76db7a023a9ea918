// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Patches: sub-meshes with a declared boundary decomposition

use super::fit::fit_similarity;
use crate::error::{MeshError, Result};
use crate::geometry::{HalfedgeId, VertexId};
use crate::overlay::AttributedMesh;
use nalgebra::{Point3, Similarity3};

/// Default distance under which fit targets count as the same point
pub const DEFAULT_FIT_EPSILON: f64 = 1e-9;

/// A self-contained sub-mesh whose outer boundary is split into sides.
///
/// Corners are listed in counter-clockwise face order. Segment `i` is the
/// run of boundary half-edges from corner `i + 1` back to corner `i`, in
/// boundary chain order, so it traverses side `i` against the face winding.
#[derive(Debug, Clone)]
pub struct Patch {
    mesh: AttributedMesh,
    corners: Vec<VertexId>,
    segments: Vec<Vec<HalfedgeId>>,
    fit_epsilon: f64,
}

impl Patch {
    pub fn new(mesh: AttributedMesh) -> Self {
        Self {
            mesh,
            corners: Vec::new(),
            segments: Vec::new(),
            fit_epsilon: DEFAULT_FIT_EPSILON,
        }
    }

    pub fn with_fit_epsilon(mut self, epsilon: f64) -> Self {
        self.fit_epsilon = epsilon;
        self
    }

    pub(crate) fn set_fit_epsilon(&mut self, epsilon: f64) {
        self.fit_epsilon = epsilon;
    }

    pub fn mesh(&self) -> &AttributedMesh {
        &self.mesh
    }

    pub fn corners(&self) -> &[VertexId] {
        &self.corners
    }

    pub fn segment(&self, index: usize) -> Option<&[HalfedgeId]> {
        self.segments.get(index).map(Vec::as_slice)
    }

    pub fn segments(&self) -> &[Vec<HalfedgeId>] {
        &self.segments
    }

    pub fn boundary_count(&self) -> usize {
        self.segments.len()
    }

    pub(crate) fn into_parts(self) -> (AttributedMesh, Vec<Vec<HalfedgeId>>) {
        (self.mesh, self.segments)
    }

    /// Split the boundary loop at the given corners.
    ///
    /// Every corner must be a boundary vertex and the corners must appear on
    /// one boundary loop in the given order.
    pub fn define_boundaries(&mut self, corners: &[VertexId]) -> Result<()> {
        const OP: &str = "define_boundaries";
        let mesh = self.mesh.mesh();
        if corners.is_empty() {
            return Err(MeshError::invalid(OP, "no corners given"));
        }

        let mut segments = Vec::with_capacity(corners.len());
        for i in 0..corners.len() {
            let (from, to) = (corners[(i + 1) % corners.len()], corners[i]);
            mesh.ensure_vertex(from)?;
            let incoming = mesh
                .boundary_incoming(from)
                .ok_or_else(|| MeshError::invalid(OP, "corner is not on the boundary"))?;

            let mut run = Vec::new();
            for h in mesh.halfedge_loop(mesh.next(incoming)) {
                run.push(h);
                let head = mesh.head(h);
                if head == to {
                    break;
                }
                if corners.contains(&head) {
                    return Err(MeshError::invalid(OP, "corners are not in boundary order"));
                }
            }
            if run.last().map(|&h| mesh.head(h)) != Some(to) {
                return Err(MeshError::invalid(OP, "corners are not on one boundary loop"));
            }
            segments.push(run);
        }

        self.corners = corners.to_vec();
        self.segments = segments;
        Ok(())
    }

    /// Insert `vertex` as a new corner inside segment `index`
    pub fn split_boundaries(&mut self, index: usize, vertex: VertexId) -> Result<()> {
        const OP: &str = "split_boundaries";
        let segment = self
            .segments
            .get(index)
            .ok_or_else(|| MeshError::invalid(OP, format!("no boundary segment {index}")))?;
        let mesh = self.mesh.mesh();
        let split = segment[..segment.len().saturating_sub(1)]
            .iter()
            .position(|&h| mesh.head(h) == vertex)
            .ok_or_else(|| MeshError::invalid(OP, "vertex is not inside the segment"))?;

        // vertex -> corner[index] stays at `index`
        let near = self.segments[index].split_off(split + 1);
        let far = std::mem::replace(&mut self.segments[index], near);
        self.segments.insert(index + 1, far);
        self.corners.insert(index + 1, vertex);
        Ok(())
    }

    /// Merge segment `index` with the following one, dropping the corner
    /// between them
    pub fn combine_boundaries(&mut self, index: usize) -> Result<()> {
        const OP: &str = "combine_boundaries";
        let count = self.segments.len();
        if index >= count || count < 2 {
            return Err(MeshError::invalid(
                OP,
                format!("cannot combine segment {index} of {count}"),
            ));
        }
        let following = (index + 1) % count;
        let mut merged = std::mem::take(&mut self.segments[following]);
        merged.append(&mut self.segments[index]);
        self.segments[index] = merged;
        self.segments.remove(following);
        self.corners.remove(following);
        Ok(())
    }

    /// Rotate the corner list so that corner `n` becomes corner 0
    pub fn shift_boundaries(&mut self, n: usize) {
        if self.corners.is_empty() {
            return;
        }
        let n = n % self.corners.len();
        self.corners.rotate_left(n);
        self.segments.rotate_left(n);
    }

    pub fn corner_positions(&self) -> Vec<Point3<f64>> {
        self.corners
            .iter()
            .map(|&v| self.mesh.mesh().position(v))
            .collect()
    }

    /// Move, rotate and uniformly scale the patch so its corners land on
    /// `targets` (see [`fit_similarity`] for which targets are used)
    pub fn auto_adjust(&mut self, targets: &[Point3<f64>]) -> Result<Similarity3<f64>> {
        let fit = fit_similarity(&self.corner_positions(), targets, self.fit_epsilon)?;
        self.mesh.apply_linear_transform(&fit.to_homogeneous())?;
        Ok(fit)
    }
}
