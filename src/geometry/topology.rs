// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local topological operators
//!
//! Every operator validates its preconditions first, collects the handles it
//! is going to rewrite, and only then mutates, so a returned error leaves the
//! mesh untouched unless stated otherwise.

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex};
use super::handles::{FaceId, HalfedgeId, VertexId};
use crate::error::{MeshError, Result};
use log::debug;
use nalgebra::Point3;
use slotmap::SecondaryMap;

/// Translation of another mesh's handles after [`HalfEdgeMesh::combine_geometry`]
#[derive(Debug, Clone, Default)]
pub struct CombineMap {
    pub vertices: SecondaryMap<VertexId, VertexId>,
    pub halfedges: SecondaryMap<HalfedgeId, HalfedgeId>,
    pub faces: SecondaryMap<FaceId, FaceId>,
}

impl CombineMap {
    pub fn vertex(&self, v: VertexId) -> Option<VertexId> {
        self.vertices.get(v).copied()
    }

    pub fn halfedge(&self, h: HalfedgeId) -> Option<HalfedgeId> {
        self.halfedges.get(h).copied()
    }

    pub fn face(&self, f: FaceId) -> Option<FaceId> {
        self.faces.get(f).copied()
    }
}

/// The four half-edges around a degree-2 vertex `m` between `a` and `b`
#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeChain {
    /// a -> m
    pub first: HalfedgeId,
    /// m -> b
    pub second: HalfedgeId,
    /// b -> m
    pub second_opposite: HalfedgeId,
    /// m -> a
    pub first_opposite: HalfedgeId,
}

impl HalfEdgeMesh {
    /// Weld two boundary half-edges of opposite orientation into one edge.
    ///
    /// `e1` runs `a -> b` and `e2` runs `c -> d`; afterwards `c` is merged
    /// into `b` and `d` into `a` (no-ops when they are already the same
    /// vertex). Returns the surviving half-edge `b -> a` that used to be
    /// `e1`'s opposite.
    pub fn connect_edges(&mut self, e1: HalfedgeId, e2: HalfedgeId) -> Result<HalfedgeId> {
        const OP: &str = "connect_edges";
        self.ensure_halfedge(e1)?;
        self.ensure_halfedge(e2)?;
        if e1 == e2 {
            return Err(MeshError::invalid(OP, "cannot connect a half-edge to itself"));
        }
        if !self.is_boundary_halfedge(e1) || !self.is_boundary_halfedge(e2) {
            return Err(MeshError::invalid(OP, "both half-edges must be on the boundary"));
        }

        let (o1, o2) = (self.opposite(e1), self.opposite(e2));
        if o1 == e2 {
            return Err(MeshError::invalid(OP, "half-edges belong to the same loose edge"));
        }
        let (a, b) = (self.tail(e1), self.head(e1));
        let (c, d) = (self.tail(e2), self.head(e2));
        if a == c || b == d {
            return Err(MeshError::invalid(OP, "half-edges run in the same direction"));
        }

        let (p1, n1) = (self.prev(e1), self.next(e1));
        let (p2, n2) = (self.prev(e2), self.next(e2));
        // A single boundary edge between the two would collapse to a loop
        if (n1 != e2 && n1 == p2) || (n2 != e1 && n2 == p1) {
            return Err(MeshError::invalid(
                OP,
                "welding would collapse the boundary edge between the half-edges",
            ));
        }

        let merged_into_b: Vec<HalfedgeId> = if c != b {
            self.vertex_halfedges(c).collect()
        } else {
            Vec::new()
        };
        let merged_into_a: Vec<HalfedgeId> = if d != a {
            self.vertex_halfedges(d).collect()
        } else {
            Vec::new()
        };

        if n1 != e2 {
            self.link(p2, n1);
        }
        if n2 != e1 {
            self.link(p1, n2);
        }

        for h in merged_into_b {
            self.halfedges[h].vertex = b;
        }
        for h in merged_into_a {
            self.halfedges[h].vertex = a;
        }
        if c != b {
            self.vertices.remove(c);
            debug!("{OP}: merged seam vertex {c:?} into {b:?}");
        }
        if d != a {
            self.vertices.remove(d);
            debug!("{OP}: merged seam vertex {d:?} into {a:?}");
        }

        self.halfedges[o1].opposite = o2;
        self.halfedges[o2].opposite = o1;
        self.halfedges.remove(e1);
        self.halfedges.remove(e2);

        self.vertices[b].halfedge = Some(o2);
        self.vertices[a].halfedge = Some(o1);
        self.adjust_vertex_halfedge(b);
        self.adjust_vertex_halfedge(a);

        Ok(o1)
    }

    /// Cut an interior edge into two boundary half-edges.
    ///
    /// Returns the new opposites of `edge` and of `edge.opposite`. An endpoint
    /// that was already on the boundary is duplicated so that each copy keeps
    /// the fan on one side of the cut.
    pub fn disconnect_edge(&mut self, edge: HalfedgeId) -> Result<(HalfedgeId, HalfedgeId)> {
        const OP: &str = "disconnect_edge";
        self.ensure_halfedge(edge)?;
        if self.is_boundary_edge(edge) {
            return Err(MeshError::invalid(OP, "edge is already on the boundary"));
        }

        let h = edge;
        let o = self.opposite(h);
        let (a, b) = (self.tail(h), self.head(h));
        let b_gap = self.first_boundary_after(h);
        let a_gap = self.first_boundary_after(o);

        let new_h = self.halfedges.insert(HalfEdge::dangling(a));
        let new_o = self.halfedges.insert(HalfEdge::dangling(b));
        self.halfedges[h].opposite = new_h;
        self.halfedges[new_h].opposite = h;
        self.halfedges[o].opposite = new_o;
        self.halfedges[new_o].opposite = o;

        // At b: new_o arrives, new_h leaves
        match b_gap {
            None => self.link(new_o, new_h),
            Some(incoming) => {
                let outgoing = self.next(incoming);
                self.link(incoming, new_h);
                self.link(new_o, outgoing);
            }
        }
        // At a: new_h arrives, new_o leaves
        match a_gap {
            None => self.link(new_h, new_o),
            Some(incoming) => {
                let outgoing = self.next(incoming);
                self.link(incoming, new_o);
                self.link(new_h, outgoing);
            }
        }

        match b_gap {
            None => self.vertices[b].halfedge = Some(new_o),
            Some(incoming) => {
                self.split_off_fan(b, new_o);
                self.vertices[b].halfedge = Some(incoming);
            }
        }
        match a_gap {
            None => self.vertices[a].halfedge = Some(new_h),
            Some(incoming) => {
                self.split_off_fan(a, new_h);
                self.vertices[a].halfedge = Some(incoming);
            }
        }

        Ok((new_h, new_o))
    }

    /// First incoming boundary half-edge met walking the ring forward from
    /// `start`, or `None` when the walk comes back around.
    fn first_boundary_after(&self, start: HalfedgeId) -> Option<HalfedgeId> {
        self.ring_from(start)
            .skip(1)
            .find(|&h| self.is_boundary_halfedge(h))
    }

    /// Give the fan reached from `incoming` its own copy of `v`
    fn split_off_fan(&mut self, v: VertexId, incoming: HalfedgeId) -> VertexId {
        let fan: Vec<HalfedgeId> = self.ring_from(incoming).collect();
        let copy = self.vertices.insert(Vertex {
            position: self.vertices[v].position,
            halfedge: Some(incoming),
        });
        for h in fan {
            self.halfedges[h].vertex = copy;
        }
        debug!("disconnect_edge: duplicated boundary vertex {v:?} as {copy:?}");
        copy
    }

    /// Remove an edge and merge the faces on both sides of it.
    ///
    /// With two distinct faces the second is absorbed into the first. With
    /// the same face on both sides the edge must be a slit hanging off the
    /// rest of the ring; its tip vertex is removed as well. Returns the
    /// surviving face.
    pub fn merge_faces(&mut self, edge: HalfedgeId) -> Result<FaceId> {
        const OP: &str = "merge_faces";
        self.ensure_halfedge(edge)?;
        let h = edge;
        let o = self.opposite(h);
        let (Some(kept), Some(absorbed)) = (self.halfedge_face(h), self.halfedge_face(o)) else {
            return Err(MeshError::invalid(OP, "edge has no face on one side"));
        };
        let (a, b) = (self.tail(h), self.head(h));
        let (h_prev, h_next) = (self.prev(h), self.next(h));
        let (o_prev, o_next) = (self.prev(o), self.next(o));

        if kept != absorbed {
            let ring: Vec<HalfedgeId> = self.face_halfedges(absorbed).collect();
            for x in ring {
                self.halfedges[x].face = Some(kept);
            }
            self.link(h_prev, o_next);
            self.link(o_prev, h_next);
            if self.vertices[b].halfedge == Some(h) {
                self.vertices[b].halfedge = Some(o_prev);
            }
            if self.vertices[a].halfedge == Some(o) {
                self.vertices[a].halfedge = Some(h_prev);
            }
            self.faces[kept].halfedge = h_prev;
            self.faces.remove(absorbed);
            self.halfedges.remove(h);
            self.halfedges.remove(o);
            return Ok(kept);
        }

        let tip_at_head = h_next == o;
        let tip_at_tail = h_prev == o;
        if tip_at_head == tip_at_tail {
            return Err(MeshError::invalid(
                OP,
                "same face on both sides but the edge is not a slit",
            ));
        }
        if self.face_edge_count(kept) < 5 {
            return Err(MeshError::invalid(OP, "removing the slit would leave a degenerate face"));
        }

        if tip_at_head {
            self.link(h_prev, o_next);
            if self.vertices[a].halfedge == Some(o) {
                self.vertices[a].halfedge = Some(h_prev);
            }
            self.faces[kept].halfedge = h_prev;
            self.vertices.remove(b);
        } else {
            self.link(o_prev, h_next);
            if self.vertices[b].halfedge == Some(h) {
                self.vertices[b].halfedge = Some(o_prev);
            }
            self.faces[kept].halfedge = o_prev;
            self.vertices.remove(a);
        }
        self.halfedges.remove(h);
        self.halfedges.remove(o);
        Ok(kept)
    }

    /// Split the single face shared by `v1` and `v2` with a new edge.
    ///
    /// Returns the new half-edge `v1 -> v2`, which stays in the original
    /// face; its opposite bounds the newly created face.
    pub fn split_face(&mut self, v1: VertexId, v2: VertexId) -> Result<HalfedgeId> {
        const OP: &str = "split_face";
        self.ensure_vertex(v1)?;
        self.ensure_vertex(v2)?;
        if v1 == v2 {
            return Err(MeshError::invalid(OP, "cannot split a face between a vertex and itself"));
        }

        let mut shared: Vec<(FaceId, HalfedgeId, HalfedgeId)> = Vec::new();
        for h1 in self.vertex_halfedges(v1) {
            let Some(f) = self.halfedge_face(h1) else {
                continue;
            };
            if shared.iter().any(|&(g, _, _)| g == f) {
                continue;
            }
            if let Some(h2) = self.face_halfedges(f).find(|&x| self.head(x) == v2) {
                shared.push((f, h1, h2));
            }
        }
        let &[(face, h1, h2)] = shared.as_slice() else {
            return Err(MeshError::invalid(
                OP,
                format!("vertices must share exactly one face, they share {}", shared.len()),
            ));
        };
        let (h1_next, h2_next) = (self.next(h1), self.next(h2));
        if self.head(h1_next) == v2 || self.head(h2_next) == v1 {
            return Err(MeshError::invalid(OP, "vertices are already adjacent in the face"));
        }

        let n = self.new_edge(v1, v2);
        let m = self.opposite(n);
        self.link(h1, n);
        self.link(n, h2_next);
        self.link(h2, m);
        self.link(m, h1_next);

        self.halfedges[n].face = Some(face);
        self.faces[face].halfedge = n;
        let created = self.faces.insert(Face { halfedge: m });
        let ring: Vec<HalfedgeId> = self.halfedge_loop(m).collect();
        for x in ring {
            self.halfedges[x].face = Some(created);
        }

        Ok(n)
    }

    /// Insert a vertex at the midpoint of an edge
    pub fn split_edge(&mut self, edge: HalfedgeId) -> Result<VertexId> {
        self.split_edge_at(edge, 0.5)
    }

    /// Insert a vertex at `tail + t * (head - tail)` along an edge.
    ///
    /// `edge` is shortened to end at the new vertex and a new half-edge
    /// continues from it to the old head; the opposite side is treated the
    /// same way.
    pub fn split_edge_at(&mut self, edge: HalfedgeId, t: f64) -> Result<VertexId> {
        self.ensure_halfedge(edge)?;
        let h = edge;
        let o = self.opposite(h);
        let (a, b) = (self.tail(h), self.head(h));
        let (pa, pb) = (self.position(a), self.position(b));
        let middle = self.create_vertex(Point3::from(pa.coords.lerp(&pb.coords, t)));

        let h_next = self.next(h);
        let o_next = self.next(o);
        let h2 = self.halfedges.insert(HalfEdge {
            face: self.halfedge_face(h),
            ..HalfEdge::dangling(b)
        });
        let o2 = self.halfedges.insert(HalfEdge {
            face: self.halfedge_face(o),
            ..HalfEdge::dangling(a)
        });
        self.halfedges[h].vertex = middle;
        self.halfedges[o].vertex = middle;

        self.link(h, h2);
        self.link(h2, h_next);
        self.link(o, o2);
        self.link(o2, o_next);
        self.halfedges[h].opposite = o2;
        self.halfedges[o2].opposite = h;
        self.halfedges[h2].opposite = o;
        self.halfedges[o].opposite = h2;

        self.vertices[middle].halfedge = Some(if self.is_boundary_halfedge(o) { o } else { h });
        if self.vertices[b].halfedge == Some(h) {
            self.vertices[b].halfedge = Some(h2);
        }
        if self.vertices[a].halfedge == Some(o) {
            self.vertices[a].halfedge = Some(o2);
        }

        Ok(middle)
    }

    /// The chain `a -> m -> b` through a vertex of degree two
    pub(crate) fn edge_chain(&self, middle: VertexId) -> Result<EdgeChain> {
        const OP: &str = "merge_edges";
        self.ensure_vertex(middle)?;
        let ring: Vec<HalfedgeId> = self.vertex_halfedges(middle).collect();
        if ring.len() != 2 {
            return Err(MeshError::invalid(
                OP,
                format!("vertex must have degree 2, it has degree {}", ring.len()),
            ));
        }
        let first = ring[0];
        let second = self.next(first);
        let second_opposite = self.opposite(second);
        let first_opposite = self.next(second_opposite);
        if self.opposite(first_opposite) != first {
            return Err(MeshError::CorruptTopology(format!(
                "ring of degree-2 vertex {middle:?} is inconsistent"
            )));
        }
        if self.tail(first) == self.head(second) {
            return Err(MeshError::invalid(OP, "merging would create a loop edge"));
        }
        for side in [first, second_opposite] {
            if let Some(f) = self.halfedge_face(side) {
                if self.face_edge_count(f) < 4 {
                    return Err(MeshError::invalid(
                        OP,
                        "merging would leave a face with fewer than 3 edges",
                    ));
                }
            }
        }
        Ok(EdgeChain {
            first,
            second,
            second_opposite,
            first_opposite,
        })
    }

    /// Remove a degree-2 vertex, joining its two edges into one.
    ///
    /// Returns the surviving half-edge running from the first neighbour to
    /// the second.
    pub fn merge_edges(&mut self, middle: VertexId) -> Result<HalfedgeId> {
        let EdgeChain {
            first: h,
            second: h2,
            second_opposite: o,
            first_opposite: o2,
        } = self.edge_chain(middle)?;
        let (a, b) = (self.tail(h), self.head(h2));
        let (h2_next, o2_next) = (self.next(h2), self.next(o2));

        self.halfedges[h].vertex = b;
        self.halfedges[o].vertex = a;
        self.link(h, h2_next);
        self.link(o, o2_next);
        self.halfedges[h].opposite = o;
        self.halfedges[o].opposite = h;

        if self.vertices[b].halfedge == Some(h2) {
            self.vertices[b].halfedge = Some(h);
        }
        if self.vertices[a].halfedge == Some(o2) {
            self.vertices[a].halfedge = Some(o);
        }
        if let Some(f) = self.halfedge_face(h2) {
            if self.faces[f].halfedge == h2 {
                self.faces[f].halfedge = h;
            }
        }
        if let Some(f) = self.halfedge_face(o2) {
            if self.faces[f].halfedge == o2 {
                self.faces[f].halfedge = o;
            }
        }

        self.halfedges.remove(h2);
        self.halfedges.remove(o2);
        self.vertices.remove(middle);
        Ok(h)
    }

    /// Move every element of `other` into this mesh as a disjoint piece
    pub fn combine_geometry(&mut self, other: HalfEdgeMesh) -> CombineMap {
        let mut map = CombineMap::default();

        for (v, vertex) in &other.vertices {
            let id = self.vertices.insert(Vertex {
                position: vertex.position,
                halfedge: None,
            });
            map.vertices.insert(v, id);
        }
        for (h, he) in &other.halfedges {
            let id = self.halfedges.insert(HalfEdge::dangling(map.vertices[he.vertex]));
            map.halfedges.insert(h, id);
        }
        for (f, face) in &other.faces {
            let id = self.faces.insert(Face {
                halfedge: map.halfedges[face.halfedge],
            });
            map.faces.insert(f, id);
        }

        for (h, he) in &other.halfedges {
            let record = &mut self.halfedges[map.halfedges[h]];
            record.next = map.halfedges[he.next];
            record.prev = map.halfedges[he.prev];
            record.opposite = map.halfedges[he.opposite];
            record.face = he.face.map(|f| map.faces[f]);
        }
        for (v, vertex) in &other.vertices {
            self.vertices[map.vertices[v]].halfedge = vertex.halfedge.map(|h| map.halfedges[h]);
        }

        map
    }
}
