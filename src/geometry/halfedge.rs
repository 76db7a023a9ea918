// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Half-edge mesh representation
//!
//! Every undirected edge is stored as two half-edges pointing in opposite
//! directions. A half-edge points *to* its `vertex` and belongs to the face on
//! its left; half-edges without a face form the boundary and are chained
//! through `next`/`prev` just like face rings, so walking `next.opposite`
//! around a vertex crosses boundary gaps and always comes back to the start.
//!
//! Each vertex stores one *incoming* half-edge. Whenever a vertex lies on the
//! boundary that half-edge is kept a boundary one, which is what lets
//! [`HalfEdgeMesh::create_face`] find a free gap in O(1).

use super::handles::{FaceId, HalfedgeId, VertexId};
use crate::error::{MeshError, Result};
use crate::utils::math::{newell_normal, normalize_or_zero};
use ahash::AHashSet;
use log::debug;
use nalgebra::{Point3, Vector3};
use slotmap::{DenseSlotMap, Key};

/// Vertex with position and one incoming half-edge
#[derive(Debug, Clone)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub(crate) halfedge: Option<HalfedgeId>,
}

impl Vertex {
    /// One incoming half-edge, `None` for an isolated vertex
    pub fn halfedge(&self) -> Option<HalfedgeId> {
        self.halfedge
    }
}

/// Half-edge in a half-edge mesh
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// Next half-edge around the face (or along the boundary chain)
    pub(crate) next: HalfedgeId,
    /// Previous half-edge around the face (or along the boundary chain)
    pub(crate) prev: HalfedgeId,
    /// Same edge, opposite direction
    pub(crate) opposite: HalfedgeId,
    /// Vertex this half-edge points to
    pub(crate) vertex: VertexId,
    /// Face on the left, `None` on the boundary
    pub(crate) face: Option<FaceId>,
}

impl HalfEdge {
    pub(crate) fn dangling(vertex: VertexId) -> Self {
        Self {
            next: HalfedgeId::null(),
            prev: HalfedgeId::null(),
            opposite: HalfedgeId::null(),
            vertex,
            face: None,
        }
    }

    pub fn next(&self) -> HalfedgeId {
        self.next
    }

    pub fn prev(&self) -> HalfedgeId {
        self.prev
    }

    pub fn opposite(&self) -> HalfedgeId {
        self.opposite
    }

    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    pub fn face(&self) -> Option<FaceId> {
        self.face
    }

    pub fn is_boundary(&self) -> bool {
        self.face.is_none()
    }
}

/// Polygon face referencing one half-edge of its ring
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) halfedge: HalfedgeId,
}

impl Face {
    pub fn halfedge(&self) -> HalfedgeId {
        self.halfedge
    }
}

/// Polygonal half-edge mesh with 2-manifold-with-boundary topology
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: DenseSlotMap<VertexId, Vertex>,
    pub(crate) halfedges: DenseSlotMap<HalfedgeId, HalfEdge>,
    pub(crate) faces: DenseSlotMap<FaceId, Face>,
}

impl HalfEdgeMesh {
    /// Create an empty half-edge mesh
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn halfedge_count(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.halfedges.len() / 2
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex handles in storage order
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys()
    }

    /// Half-edge handles in storage order
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfedgeId> + '_ {
        self.halfedges.keys()
    }

    /// Face handles in storage order
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.keys()
    }

    pub fn vertex(&self, v: VertexId) -> Option<&Vertex> {
        self.vertices.get(v)
    }

    pub fn halfedge(&self, h: HalfedgeId) -> Option<&HalfEdge> {
        self.halfedges.get(h)
    }

    pub fn face(&self, f: FaceId) -> Option<&Face> {
        self.faces.get(f)
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains_key(v)
    }

    pub fn contains_halfedge(&self, h: HalfedgeId) -> bool {
        self.halfedges.contains_key(h)
    }

    pub fn contains_face(&self, f: FaceId) -> bool {
        self.faces.contains_key(f)
    }

    pub(crate) fn ensure_vertex(&self, v: VertexId) -> Result<()> {
        if self.vertices.contains_key(v) {
            Ok(())
        } else {
            Err(MeshError::StaleHandle("vertex"))
        }
    }

    pub(crate) fn ensure_halfedge(&self, h: HalfedgeId) -> Result<()> {
        if self.halfedges.contains_key(h) {
            Ok(())
        } else {
            Err(MeshError::StaleHandle("half-edge"))
        }
    }

    pub(crate) fn ensure_face(&self, f: FaceId) -> Result<()> {
        if self.faces.contains_key(f) {
            Ok(())
        } else {
            Err(MeshError::StaleHandle("face"))
        }
    }

    // Navigation. These index the tables directly and panic on a stale
    // handle, like slice indexing.

    pub fn next(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h].next
    }

    pub fn prev(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h].prev
    }

    pub fn opposite(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h].opposite
    }

    /// Vertex the half-edge points to
    pub fn head(&self, h: HalfedgeId) -> VertexId {
        self.halfedges[h].vertex
    }

    /// Vertex the half-edge starts from
    pub fn tail(&self, h: HalfedgeId) -> VertexId {
        self.halfedges[self.halfedges[h].opposite].vertex
    }

    pub fn halfedge_face(&self, h: HalfedgeId) -> Option<FaceId> {
        self.halfedges[h].face
    }

    pub fn is_boundary_halfedge(&self, h: HalfedgeId) -> bool {
        self.halfedges[h].face.is_none()
    }

    /// True if either side of the edge is boundary
    pub fn is_boundary_edge(&self, h: HalfedgeId) -> bool {
        self.is_boundary_halfedge(h) || self.is_boundary_halfedge(self.opposite(h))
    }

    pub fn position(&self, v: VertexId) -> Point3<f64> {
        self.vertices[v].position
    }

    pub fn set_position(&mut self, v: VertexId, position: Point3<f64>) {
        self.vertices[v].position = position;
    }

    pub fn is_isolated(&self, v: VertexId) -> bool {
        self.vertices[v].halfedge.is_none()
    }

    /// True if the vertex has at least one incident boundary half-edge
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.boundary_incoming(v).is_some()
    }

    /// First incoming boundary half-edge found walking the vertex ring
    pub fn boundary_incoming(&self, v: VertexId) -> Option<HalfedgeId> {
        self.vertex_halfedges(v)
            .find(|&h| self.is_boundary_halfedge(h))
    }

    /// Number of incident edges
    pub fn vertex_degree(&self, v: VertexId) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Incoming half-edges around a vertex, walking `next.opposite`
    pub fn vertex_halfedges(&self, v: VertexId) -> VertexRing<'_> {
        let start = self.vertices.get(v).and_then(|vertex| vertex.halfedge);
        VertexRing {
            mesh: self,
            start,
            current: start,
            remaining: self.halfedges.len(),
        }
    }

    /// Incoming half-edges around the head of `start`, beginning at `start`
    pub(crate) fn ring_from(&self, start: HalfedgeId) -> VertexRing<'_> {
        VertexRing {
            mesh: self,
            start: Some(start),
            current: Some(start),
            remaining: self.halfedges.len(),
        }
    }

    /// Neighbouring vertices, one per incident edge
    pub fn vertex_neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_halfedges(v).map(move |h| self.tail(h))
    }

    /// Faces around a vertex (a face touching the vertex twice is listed twice)
    pub fn vertex_faces(&self, v: VertexId) -> impl Iterator<Item = FaceId> + '_ {
        self.vertex_halfedges(v).filter_map(move |h| self.halfedge_face(h))
    }

    /// Half-edges of a face ring, starting at the face's representative
    pub fn face_halfedges(&self, f: FaceId) -> FaceRing<'_> {
        let start = self.faces.get(f).map(|face| face.halfedge);
        FaceRing {
            mesh: self,
            start,
            current: start,
            remaining: self.halfedges.len(),
        }
    }

    /// Walk `next` from any half-edge: a face ring or a boundary chain
    pub fn halfedge_loop(&self, start: HalfedgeId) -> FaceRing<'_> {
        let start = self.halfedges.contains_key(start).then_some(start);
        FaceRing {
            mesh: self,
            start,
            current: start,
            remaining: self.halfedges.len(),
        }
    }

    /// Face corners in ring order (the tail of each ring half-edge)
    pub fn face_vertices(&self, f: FaceId) -> Vec<VertexId> {
        self.face_halfedges(f).map(|h| self.tail(h)).collect()
    }

    pub fn face_positions(&self, f: FaceId) -> Vec<Point3<f64>> {
        self.face_halfedges(f)
            .map(|h| self.position(self.tail(h)))
            .collect()
    }

    pub fn face_edge_count(&self, f: FaceId) -> usize {
        self.face_halfedges(f).count()
    }

    /// Flat (Newell) normal of a face, zero for degenerate faces
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        normalize_or_zero(&newell_normal(&self.face_positions(f)))
    }

    pub fn face_area(&self, f: FaceId) -> f64 {
        newell_normal(&self.face_positions(f)).norm() * 0.5
    }

    pub fn face_centroid(&self, f: FaceId) -> Point3<f64> {
        let positions = self.face_positions(f);
        if positions.is_empty() {
            return Point3::origin();
        }
        let sum = positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / positions.len() as f64)
    }

    /// Vector from tail to head
    pub fn halfedge_vector(&self, h: HalfedgeId) -> Vector3<f64> {
        self.position(self.head(h)) - self.position(self.tail(h))
    }

    pub fn halfedge_length(&self, h: HalfedgeId) -> f64 {
        self.halfedge_vector(h).norm()
    }

    pub fn halfedge_direction(&self, h: HalfedgeId) -> Vector3<f64> {
        normalize_or_zero(&self.halfedge_vector(h))
    }

    pub fn halfedge_midpoint(&self, h: HalfedgeId) -> Point3<f64> {
        nalgebra::center(&self.position(self.tail(h)), &self.position(self.head(h)))
    }

    /// All boundary half-edges in storage order
    pub fn boundary_halfedges(&self) -> Vec<HalfedgeId> {
        self.halfedges
            .iter()
            .filter(|(_, he)| he.is_boundary())
            .map(|(h, _)| h)
            .collect()
    }

    /// V - E + F
    pub fn euler_characteristic(&self) -> i64 {
        self.vertex_count() as i64 - self.edge_count() as i64 + self.face_count() as i64
    }

    /// Number of edge-connected pieces (isolated vertices count as pieces)
    pub fn connected_components(&self) -> usize {
        let mut visited: AHashSet<VertexId> = AHashSet::with_capacity(self.vertices.len());
        let mut components = 0;
        let mut stack = Vec::new();

        for seed in self.vertices.keys() {
            if !visited.insert(seed) {
                continue;
            }
            components += 1;
            stack.push(seed);
            while let Some(v) = stack.pop() {
                for neighbor in self.vertex_neighbors(v) {
                    if visited.insert(neighbor) {
                        stack.push(neighbor);
                    }
                }
            }
        }

        components
    }

    /// Append a vertex with no edges
    pub fn create_vertex(&mut self, position: Point3<f64>) -> VertexId {
        self.vertices.insert(Vertex {
            position,
            halfedge: None,
        })
    }

    /// Find the half-edge running `from -> to`
    pub fn find_halfedge(&self, from: VertexId, to: VertexId) -> Option<HalfedgeId> {
        self.vertex_halfedges(to).find(|&h| self.tail(h) == from)
    }

    /// Find a boundary half-edge running `from -> to`
    pub fn find_boundary_halfedge(&self, from: VertexId, to: VertexId) -> Option<HalfedgeId> {
        self.find_boundary_halfedge_excluding(from, to, None)
    }

    fn find_boundary_halfedge_excluding(
        &self,
        from: VertexId,
        to: VertexId,
        exclude: Option<HalfedgeId>,
    ) -> Option<HalfedgeId> {
        self.vertex_halfedges(to).find(|&h| {
            self.is_boundary_halfedge(h) && self.tail(h) == from && Some(h) != exclude
        })
    }

    /// Create a face from counter-clockwise ordered vertices.
    ///
    /// Existing boundary half-edges between consecutive vertices are reused;
    /// missing edges are allocated as new opposite pairs and spliced into the
    /// boundary chains at the shared vertices. Requesting a directed edge that
    /// is already used by a face is an unchecked precondition and corrupts
    /// the mesh.
    pub fn create_face(&mut self, vertices: &[VertexId]) -> Result<FaceId> {
        let n = vertices.len();
        if n < 3 {
            return Err(MeshError::invalid(
                "create_face",
                format!("a face needs at least 3 vertices, got {n}"),
            ));
        }
        for &v in vertices {
            self.ensure_vertex(v)?;
            if let Some(h) = self.vertices[v].halfedge {
                if !self.is_boundary_halfedge(h) {
                    return Err(MeshError::invalid(
                        "create_face",
                        "vertex is already surrounded by faces",
                    ));
                }
            }
        }

        // Reusable boundary half-edge per side. A vertex touched twice by the
        // same face can offer two candidates; skip the one consumed last.
        let mut sides: Vec<Option<HalfedgeId>> = Vec::with_capacity(n);
        let mut last_consumed = None;
        for i in 0..n {
            let (from, to) = (vertices[i], vertices[(i + 1) % n]);
            let found = self.find_boundary_halfedge_excluding(from, to, last_consumed);
            debug_assert!(
                found.is_some() || self.find_halfedge(from, to).is_none(),
                "directed edge requested twice"
            );
            if found.is_some() {
                last_consumed = found;
            }
            sides.push(found);
        }

        // Two reused sides meeting at a vertex must be adjacent in its
        // boundary chain; otherwise move the fans between them to another gap.
        for i in 0..n {
            let ii = (i + 1) % n;
            let (Some(inner_prev), Some(inner_next)) = (sides[i], sides[ii]) else {
                continue;
            };
            if self.next(inner_prev) == inner_next {
                continue;
            }
            self.relink_patch(inner_prev, inner_next)?;
        }

        let inner: Vec<HalfedgeId> = (0..n)
            .map(|i| match sides[i] {
                Some(h) => h,
                None => self.new_edge(vertices[i], vertices[(i + 1) % n]),
            })
            .collect();

        let face = self.faces.insert(Face { halfedge: inner[0] });

        for i in 0..n {
            let ii = (i + 1) % n;
            let corner = vertices[ii];
            let (inner_prev, inner_next) = (inner[i], inner[ii]);
            match (sides[i].is_none(), sides[ii].is_none()) {
                (false, false) => {}
                (true, false) => {
                    let outer_next = self.opposite(inner_prev);
                    let boundary_prev = self.prev(inner_next);
                    self.link(boundary_prev, outer_next);
                    self.vertices[corner].halfedge = Some(boundary_prev);
                }
                (false, true) => {
                    let outer_prev = self.opposite(inner_next);
                    let boundary_next = self.next(inner_prev);
                    self.link(outer_prev, boundary_next);
                    self.vertices[corner].halfedge = Some(outer_prev);
                }
                (true, true) => {
                    let outer_prev = self.opposite(inner_next);
                    let outer_next = self.opposite(inner_prev);
                    match self.vertices[corner].halfedge {
                        None => {
                            self.link(outer_prev, outer_next);
                            self.vertices[corner].halfedge = Some(outer_prev);
                        }
                        Some(boundary_prev) => {
                            let boundary_next = self.next(boundary_prev);
                            self.link(boundary_prev, outer_next);
                            self.link(outer_prev, boundary_next);
                        }
                    }
                }
            }
            self.link(inner_prev, inner_next);
        }

        for &h in &inner {
            self.halfedges[h].face = Some(face);
        }
        for &v in vertices {
            self.adjust_vertex_halfedge(v);
        }

        Ok(face)
    }

    /// Move the boundary fans sitting between `inner_prev` and `inner_next`
    /// into the next free gap of their shared vertex.
    fn relink_patch(&mut self, inner_prev: HalfedgeId, inner_next: HalfedgeId) -> Result<()> {
        let outer_prev = self.opposite(inner_next);
        let mut boundary_prev = outer_prev;
        let mut steps = self.halfedges.len();
        loop {
            boundary_prev = self.opposite(self.next(boundary_prev));
            if self.is_boundary_halfedge(boundary_prev) && boundary_prev != inner_prev {
                break;
            }
            steps = steps.saturating_sub(1);
            if boundary_prev == outer_prev || steps == 0 {
                return Err(MeshError::invalid(
                    "create_face",
                    "no free boundary gap to re-link the patch into",
                ));
            }
        }

        let boundary_next = self.next(boundary_prev);
        if boundary_next == inner_next {
            return Err(MeshError::invalid("create_face", "patch re-linking failed"));
        }

        let patch_start = self.next(inner_prev);
        let patch_end = self.prev(inner_next);
        debug!(
            "create_face: re-linking boundary patch at vertex {:?}",
            self.head(inner_prev)
        );
        self.link(boundary_prev, patch_start);
        self.link(patch_end, boundary_next);
        self.link(inner_prev, inner_next);
        Ok(())
    }

    /// Allocate an opposite pair `from -> to` / `to -> from`, both boundary,
    /// and return the `from -> to` half.
    pub(crate) fn new_edge(&mut self, from: VertexId, to: VertexId) -> HalfedgeId {
        let h = self.halfedges.insert(HalfEdge::dangling(to));
        let o = self.halfedges.insert(HalfEdge::dangling(from));
        self.halfedges[h].opposite = o;
        self.halfedges[o].opposite = h;
        h
    }

    /// Set `a.next = b` and `b.prev = a`
    pub(crate) fn link(&mut self, a: HalfedgeId, b: HalfedgeId) {
        self.halfedges[a].next = b;
        self.halfedges[b].prev = a;
    }

    /// Point the vertex at an incoming boundary half-edge when it has one
    pub(crate) fn adjust_vertex_halfedge(&mut self, v: VertexId) {
        if let Some(boundary) = self.boundary_incoming(v) {
            self.vertices[v].halfedge = Some(boundary);
        }
    }
}

/// Iterator over the incoming half-edges of a vertex
pub struct VertexRing<'a> {
    mesh: &'a HalfEdgeMesh,
    start: Option<HalfedgeId>,
    current: Option<HalfedgeId>,
    remaining: usize,
}

impl Iterator for VertexRing<'_> {
    type Item = HalfedgeId;

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.current?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let following = self.mesh.opposite(self.mesh.next(h));
        self.current = (Some(following) != self.start).then_some(following);
        Some(h)
    }
}

/// Iterator over a face ring or boundary chain
pub struct FaceRing<'a> {
    mesh: &'a HalfEdgeMesh,
    start: Option<HalfedgeId>,
    current: Option<HalfedgeId>,
    remaining: usize,
}

impl Iterator for FaceRing<'_> {
    type Item = HalfedgeId;

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.current?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let following = self.mesh.next(h);
        self.current = (Some(following) != self.start).then_some(following);
        Some(h)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Axis-aligned cube with corners at +-1, faces wound outward
    pub(crate) fn cube() -> (HalfEdgeMesh, Vec<VertexId>) {
        let mut mesh = HalfEdgeMesh::new();
        let v: Vec<VertexId> = [
            (-1.0, -1.0, -1.0),
            (1.0, -1.0, -1.0),
            (1.0, 1.0, -1.0),
            (-1.0, 1.0, -1.0),
            (-1.0, -1.0, 1.0),
            (1.0, -1.0, 1.0),
            (1.0, 1.0, 1.0),
            (-1.0, 1.0, 1.0),
        ]
        .iter()
        .map(|&(x, y, z)| mesh.create_vertex(Point3::new(x, y, z)))
        .collect();

        for quad in [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [0, 4, 7, 3],
            [1, 2, 6, 5],
        ] {
            mesh.create_face(&quad.map(|i| v[i])).unwrap();
        }
        (mesh, v)
    }

    fn quad() -> (HalfEdgeMesh, Vec<VertexId>, FaceId) {
        let mut mesh = HalfEdgeMesh::new();
        let v: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| mesh.create_vertex(Point3::new(x, y, 0.0)))
            .collect();
        let f = mesh.create_face(&v).unwrap();
        (mesh, v, f)
    }

    #[test]
    fn test_single_quad() {
        let (mesh, v, f) = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.halfedge_count(), 8);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.face_vertices(f), v);
        assert_eq!(mesh.boundary_halfedges().len(), 4);
        assert!((mesh.face_normal(f) - Vector3::z()).norm() < 1e-12);
        assert!((mesh.face_area(f) - 1.0).abs() < 1e-12);
        mesh.check_invariants().unwrap();

        // The boundary runs against the face orientation
        let b = mesh.find_boundary_halfedge(v[1], v[0]).unwrap();
        let chain: Vec<VertexId> = mesh.halfedge_loop(b).map(|h| mesh.head(h)).collect();
        assert_eq!(chain, vec![v[0], v[3], v[2], v[1]]);
    }

    #[test]
    fn test_find_halfedge() {
        let (mesh, v, f) = quad();
        let h = mesh.find_halfedge(v[0], v[1]).unwrap();
        assert_eq!(mesh.halfedge_face(h), Some(f));
        assert!(mesh.find_boundary_halfedge(v[0], v[1]).is_none());
        assert!(mesh.find_halfedge(v[0], v[2]).is_none());
    }

    #[test]
    fn test_too_few_vertices() {
        let mut mesh = HalfEdgeMesh::new();
        let a = mesh.create_vertex(Point3::origin());
        let b = mesh.create_vertex(Point3::new(1.0, 0.0, 0.0));
        assert!(matches!(
            mesh.create_face(&[a, b]),
            Err(MeshError::InvalidTopologyOperation { .. })
        ));
    }

    #[test]
    fn test_cube_is_closed() {
        let (mesh, v) = cube();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.edge_count(), 12);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.euler_characteristic(), 2);
        assert!(mesh.boundary_halfedges().is_empty());
        assert_eq!(mesh.connected_components(), 1);
        for &vertex in &v {
            assert_eq!(mesh.vertex_degree(vertex), 3);
            assert!(!mesh.is_boundary_vertex(vertex));
        }
        mesh.check_invariants().unwrap();
    }

    fn apex_fan(order: &[usize]) -> (HalfEdgeMesh, VertexId) {
        let mut mesh = HalfEdgeMesh::new();
        let apex = mesh.create_vertex(Point3::origin());
        let rim: Vec<VertexId> = (0..6)
            .map(|k| {
                let a = k as f64 * std::f64::consts::TAU / 6.0;
                mesh.create_vertex(Point3::new(a.cos(), a.sin(), 0.0))
            })
            .collect();

        for &k in order {
            mesh.create_face(&[apex, rim[k], rim[(k + 1) % 6]]).unwrap();
            mesh.check_invariants().unwrap();
        }
        (mesh, apex)
    }

    #[test]
    fn test_apex_fan_out_of_order() {
        // The second order leaves three separate fans at the apex whose
        // boundary gaps are chained in the wrong order, forcing a re-link.
        for order in [[0, 2, 4, 1, 3, 5], [0, 4, 2, 3, 1, 5]] {
            let (mesh, apex) = apex_fan(&order);
            assert_eq!(mesh.face_count(), 6);
            assert_eq!(mesh.edge_count(), 12);
            assert_eq!(mesh.euler_characteristic(), 1);
            assert_eq!(mesh.vertex_degree(apex), 6);
            assert!(!mesh.is_boundary_vertex(apex));
            assert_eq!(mesh.boundary_halfedges().len(), 6);
        }
    }

    #[test]
    fn test_partial_fan_keeps_boundary_handle() {
        let (mesh, apex) = apex_fan(&[0, 2, 4]);
        let handle = mesh.vertex(apex).and_then(Vertex::halfedge).unwrap();
        assert!(mesh.is_boundary_halfedge(handle));
        // Three separate fans, all reachable from one ring walk
        assert_eq!(mesh.vertex_degree(apex), 6);
    }
}
