// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Flat triangle mesh produced by export

use super::BoundingBox;
use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position, normal and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
    pub uv: Vector2<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal,
            uv: Vector2::zeros(),
        }
    }

    pub fn with_uv(mut self, uv: Vector2<f64>) -> Self {
        self.uv = uv;
        self
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    /// Same triangle with the opposite winding
    pub fn flipped(&self) -> Self {
        let [a, b, c] = self.indices;
        Self::new([a, c, b])
    }
}

/// Flat parallel arrays as consumed by renderers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshArrays {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
}

/// Triangular mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append another mesh without welding
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| Triangle::new(t.indices.map(|i| i + offset))),
        );
    }

    /// Total surface area
    pub fn surface_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.indices.map(|i| self.vertices[i].position);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Flatten into renderer arrays (single precision)
    pub fn to_arrays(&self) -> MeshArrays {
        let mut arrays = MeshArrays {
            positions: Vec::with_capacity(self.vertices.len()),
            indices: Vec::with_capacity(self.triangles.len() * 3),
            normals: Vec::with_capacity(self.vertices.len()),
            uvs: Vec::with_capacity(self.vertices.len()),
        };
        for vertex in &self.vertices {
            let p = vertex.position.cast::<f32>();
            let n = vertex.normal.cast::<f32>();
            let uv = vertex.uv.cast::<f32>();
            arrays.positions.push([p.x, p.y, p.z]);
            arrays.normals.push([n.x, n.y, n.z]);
            arrays.uvs.push([uv.x, uv.y]);
        }
        for triangle in &self.triangles {
            arrays
                .indices
                .extend(triangle.indices.iter().map(|&i| i as u32));
        }
        arrays
    }
}
