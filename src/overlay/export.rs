// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle mesh export

use super::{AttributedMesh, Shading};
use crate::config::KernelConfig;
use crate::geometry::{HalfedgeId, Mesh, Triangle, Vertex, VertexId};
use crate::utils::math::{approx_eq_vec2, approx_eq_vec3, calculate_triangle_normal};
use ahash::AHashMap;
use log::debug;
use nalgebra::Vector2;

/// Options for [`AttributedMesh::to_mesh`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Reverse the winding and negate the normals
    pub flip_faces: bool,
    /// Append an inverted copy so both sides render
    pub two_sided: bool,
    /// Use this shading for every face instead of its own
    pub shading_override: Option<Shading>,
    /// Tolerance for merging output vertices
    pub epsilon: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            flip_faces: false,
            two_sided: false,
            shading_override: None,
            epsilon: 1e-5,
        }
    }
}

impl From<&KernelConfig> for ExportOptions {
    fn from(config: &KernelConfig) -> Self {
        Self {
            flip_faces: config.flip_faces,
            two_sided: config.two_sided,
            shading_override: config.shading_override,
            epsilon: config.weld_epsilon,
        }
    }
}

/// Output vertices keyed by source vertex, merged when normal and UV agree
struct VertexCache {
    epsilon: f64,
    by_source: AHashMap<VertexId, Vec<usize>>,
}

impl VertexCache {
    fn index(&mut self, mesh: &mut Mesh, source: VertexId, candidate: Vertex) -> usize {
        let epsilon = self.epsilon;
        let entries = self.by_source.entry(source).or_default();
        if let Some(&index) = entries.iter().find(|&&index| {
            let existing = &mesh.vertices[index];
            approx_eq_vec3(&existing.normal, &candidate.normal, epsilon)
                && approx_eq_vec2(&existing.uv, &candidate.uv, epsilon)
        }) {
            return index;
        }
        let index = mesh.add_vertex(candidate);
        entries.push(index);
        index
    }
}

/// Corner index triples of a double-ended fan over `n` ring corners
pub(crate) fn fan_triangles(n: usize) -> Vec<[usize; 3]> {
    let mut triangles = Vec::with_capacity(n.saturating_sub(2));
    if n < 3 {
        return triangles;
    }
    let (mut lo, mut hi) = (0, n - 1);
    let mut from_low = true;
    while hi - lo >= 2 {
        if from_low {
            triangles.push([lo, lo + 1, hi]);
            lo += 1;
        } else {
            triangles.push([hi - 1, hi, lo]);
            hi -= 1;
        }
        from_low = !from_low;
    }
    triangles
}

impl AttributedMesh {
    /// Triangulate every face into a flat mesh.
    ///
    /// Faces are split with a fan that alternates between both ends of the
    /// ring, which keeps slivers down on long faces. Output vertices are
    /// shared between triangles when they come from the same mesh vertex
    /// with matching normal and UV.
    pub fn to_mesh(&self, options: &ExportOptions) -> Mesh {
        let half = self.mesh();
        let mut out = Mesh::with_capacity(half.vertex_count(), half.face_count() * 2);
        let mut cache = VertexCache {
            epsilon: options.epsilon,
            by_source: AHashMap::with_capacity(half.vertex_count()),
        };

        for f in half.face_ids() {
            let shading = options.shading_override.unwrap_or_else(|| self.shading(f));
            let ring: Vec<HalfedgeId> = half.face_halfedges(f).collect();
            for [i, j, k] in fan_triangles(ring.len()) {
                let corners = [ring[i], ring[j], ring[k]];
                let triangle_normal = (shading == Shading::Triangular).then(|| {
                    let [a, b, c] = corners.map(|h| half.position(half.head(h)));
                    calculate_triangle_normal(&a, &b, &c)
                });

                let indices = corners.map(|h| {
                    let normal = triangle_normal
                        .unwrap_or_else(|| self.effective_normal_with(h, shading));
                    let normal = if options.flip_faces { -normal } else { normal };
                    let uv = self.uv(h).unwrap_or_else(Vector2::zeros);
                    let vertex = Vertex::new(half.position(half.head(h)), normal).with_uv(uv);
                    cache.index(&mut out, half.head(h), vertex)
                });
                let triangle = Triangle::new(indices);
                out.add_triangle(if options.flip_faces {
                    triangle.flipped()
                } else {
                    triangle
                });
            }
        }

        if options.two_sided {
            let back = inverted(&out);
            out.merge(&back);
        }

        debug!(
            "to_mesh: {} faces -> {} triangles, {} vertices",
            half.face_count(),
            out.triangle_count(),
            out.vertex_count()
        );
        out
    }
}

/// Copy with reversed winding and negated normals
fn inverted(mesh: &Mesh) -> Mesh {
    Mesh {
        vertices: mesh
            .vertices
            .iter()
            .map(|v| Vertex {
                normal: -v.normal,
                ..*v
            })
            .collect(),
        triangles: mesh.triangles.iter().map(Triangle::flipped).collect(),
    }
}
