// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Generation-tagged handles for mesh elements
//!
//! Elements live in dense slot maps: removal swaps the last element into the
//! freed slot, and a handle to a removed element is detected through its
//! generation instead of silently aliasing whatever moved into the slot.

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a vertex of a [`HalfEdgeMesh`](super::HalfEdgeMesh)
    pub struct VertexId;

    /// Handle to a half-edge of a [`HalfEdgeMesh`](super::HalfEdgeMesh)
    pub struct HalfedgeId;

    /// Handle to a face of a [`HalfEdgeMesh`](super::HalfEdgeMesh)
    pub struct FaceId;
}
