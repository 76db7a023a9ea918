// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structural invariant checks for the half-edge graph

use super::HalfEdgeMesh;
use crate::error::{MeshError, Result};

impl HalfEdgeMesh {
    /// Verify the pointer-graph invariants.
    ///
    /// Checks that every handle is live, opposites pair up and join the same
    /// two vertices in reverse, `next`/`prev` are inverse, face rings close with
    /// a consistent face, boundary chains stay on the boundary and every vertex
    /// ring walk returns to its start. Returns the first violation found.
    pub fn check_invariants(&self) -> Result<()> {
        let corrupt = |message: String| Err(MeshError::CorruptTopology(message));

        for (h, he) in &self.halfedges {
            for (name, link) in [("next", he.next), ("prev", he.prev), ("opposite", he.opposite)] {
                if !self.halfedges.contains_key(link) {
                    return corrupt(format!("{h:?}.{name} is dangling"));
                }
            }
            if !self.vertices.contains_key(he.vertex) {
                return corrupt(format!("{h:?} points to a removed vertex"));
            }
            if let Some(f) = he.face {
                if !self.faces.contains_key(f) {
                    return corrupt(format!("{h:?} belongs to a removed face"));
                }
            }

            let opposite = &self.halfedges[he.opposite];
            if opposite.opposite != h {
                return corrupt(format!("{h:?}.opposite.opposite is not {h:?}"));
            }
            if he.opposite == h || opposite.vertex == he.vertex {
                return corrupt(format!("{h:?} and its opposite point to the same vertex"));
            }
            if self.halfedges[he.next].prev != h {
                return corrupt(format!("{h:?}.next.prev is not {h:?}"));
            }
            if self.halfedges[he.prev].next != h {
                return corrupt(format!("{h:?}.prev.next is not {h:?}"));
            }
            // Consecutive half-edges share the vertex between them
            if self.tail(he.next) != he.vertex {
                return corrupt(format!("{h:?}.next does not start where {h:?} ends"));
            }
            if self.halfedges[he.next].face != he.face {
                return corrupt(format!("{h:?}.next leaves its face ring or boundary chain"));
            }
        }

        for (f, face) in &self.faces {
            if !self.halfedges.contains_key(face.halfedge) {
                return corrupt(format!("{f:?} has a dangling half-edge"));
            }
            let mut count = 0;
            let mut h = face.halfedge;
            loop {
                if self.halfedges[h].face != Some(f) {
                    return corrupt(format!("ring of {f:?} passes through {h:?} of another face"));
                }
                count += 1;
                h = self.halfedges[h].next;
                if h == face.halfedge {
                    break;
                }
                if count > self.halfedges.len() {
                    return corrupt(format!("ring of {f:?} does not close"));
                }
            }
            if count < 3 {
                return corrupt(format!("{f:?} has only {count} edges"));
            }
        }

        for (v, vertex) in &self.vertices {
            let Some(start) = vertex.halfedge else {
                continue;
            };
            if !self.halfedges.contains_key(start) {
                return corrupt(format!("{v:?} has a dangling half-edge"));
            }
            if self.halfedges[start].vertex != v {
                return corrupt(format!("{v:?}.halfedge does not point to {v:?}"));
            }
            let mut h = start;
            let mut steps = 0;
            let mut saw_boundary = false;
            loop {
                if self.halfedges[h].vertex != v {
                    return corrupt(format!("ring walk of {v:?} left the vertex at {h:?}"));
                }
                saw_boundary |= self.halfedges[h].face.is_none();
                steps += 1;
                h = self.opposite(self.next(h));
                if h == start {
                    break;
                }
                if steps > self.halfedges.len() {
                    return corrupt(format!("ring walk of {v:?} does not return"));
                }
            }
            if saw_boundary && self.halfedges[start].face.is_some() {
                return corrupt(format!("boundary vertex {v:?} holds an interior half-edge"));
            }
        }

        Ok(())
    }
}
