// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - half-edge kernel, flat triangle meshes and primitives

mod bbox;
pub(crate) mod halfedge;
mod handles;
mod import;
mod mesh;
mod primitives;
mod topology;
mod transform;
mod validate;

pub use bbox::BoundingBox;
pub use halfedge::{Face, FaceRing, HalfEdge, HalfEdgeMesh, Vertex as HalfEdgeVertex, VertexRing};
pub use handles::{FaceId, HalfedgeId, VertexId};
pub use mesh::{Mesh, MeshArrays, Triangle, Vertex};
pub use primitives::{grid_patch, Primitive};
pub use topology::CombineMap;
pub use transform::{JacobianWarp, SpaceWarp};
