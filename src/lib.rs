// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Half-edge mesh kernel
//!
//! Polygonal surfaces stored as half-edges with local topology edits that
//! keep the mesh a 2-manifold with boundary, an attribute overlay for
//! per-corner normals, tangents and UVs, and a composition layer that welds
//! independently built patches onto the faces of a coarse scaffold.

pub mod compose;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod overlay;
pub mod utils;

pub use compose::{Patch, Scaffold};
pub use config::KernelConfig;
pub use error::{MeshError, Result};
pub use geometry::{FaceId, HalfEdgeMesh, HalfedgeId, Mesh, Primitive, VertexId};
pub use io::{export_gltf, export_json, export_stl};
pub use overlay::{AttributedMesh, ExportOptions, Shading};

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_basic_cube() {
        let result = Primitive::box_(Vector3::new(2.0, 2.0, 2.0), [1, 1, 1])
            .to_mesh(&ExportOptions::default());
        assert_eq!(result.map(|mesh| mesh.triangle_count()).ok(), Some(12));
    }
}
