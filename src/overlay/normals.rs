// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Effective normals per shading classification

use super::{AttributedMesh, Shading};
use crate::geometry::{FaceId, HalfedgeId, VertexId};
use crate::utils::math::{calculate_triangle_normal, newell_normal, normalize_or_zero};
use nalgebra::Vector3;

impl AttributedMesh {
    /// Area-weighted average of the flat normals around a vertex
    pub fn vertex_normal(&self, v: VertexId) -> Vector3<f64> {
        let mesh = self.mesh();
        let sum = mesh
            .vertex_faces(v)
            .map(|f| newell_normal(&mesh.face_positions(f)))
            .fold(Vector3::zeros(), |acc, n| acc + n);
        normalize_or_zero(&sum)
    }

    /// Stored corner normal, or the vertex normal when none is stored
    pub fn smooth_normal(&self, h: HalfedgeId) -> Vector3<f64> {
        self.normal(h)
            .map(|n| normalize_or_zero(&n))
            .unwrap_or_else(|| self.vertex_normal(self.mesh().head(h)))
    }

    /// Normal of the triangle formed by the corner and its two ring neighbours
    pub fn corner_normal(&self, h: HalfedgeId) -> Vector3<f64> {
        let mesh = self.mesh();
        calculate_triangle_normal(
            &mesh.position(mesh.tail(h)),
            &mesh.position(mesh.head(h)),
            &mesh.position(mesh.head(mesh.next(h))),
        )
    }

    /// Normal of corner `h` under the face's own shading
    pub fn effective_normal(&self, h: HalfedgeId) -> Vector3<f64> {
        match self.mesh().halfedge_face(h) {
            Some(f) => self.effective_normal_with(h, self.shading(f)),
            None => self.smooth_normal(h),
        }
    }

    /// Normal of corner `h` under the given shading
    pub fn effective_normal_with(&self, h: HalfedgeId, shading: Shading) -> Vector3<f64> {
        let Some(f) = self.mesh().halfedge_face(h) else {
            return self.smooth_normal(h);
        };
        match shading {
            Shading::Smooth => self.smooth_normal(h),
            Shading::Polygonal => self.mesh().face_normal(f),
            Shading::Triangular => self.corner_normal(h),
            Shading::DirectionalA => self.directional_normal(h, f, 0),
            Shading::DirectionalB => self.directional_normal(h, f, 1),
        }
    }

    /// Project the smooth normal onto the plane spanned by the flat normal
    /// and the direction along sides `first` and `first + 2`. The result
    /// varies along that direction and stays flat across it. Faces other
    /// than quads get the flat normal.
    fn directional_normal(&self, h: HalfedgeId, f: FaceId, first: usize) -> Vector3<f64> {
        let mesh = self.mesh();
        let flat = mesh.face_normal(f);
        let sides: Vec<HalfedgeId> = mesh.face_halfedges(f).collect();
        if sides.len() != 4 {
            return flat;
        }

        // Opposite sides of a quad run in opposite directions
        let along = mesh.halfedge_direction(sides[first]) - mesh.halfedge_direction(sides[first + 2]);
        let along = normalize_or_zero(&(along - flat * flat.dot(&along)));
        if along == Vector3::zeros() {
            return flat;
        }

        let smooth = self.smooth_normal(h);
        let projected = flat * smooth.dot(&flat) + along * smooth.dot(&along);
        let projected = normalize_or_zero(&projected);
        if projected == Vector3::zeros() {
            flat
        } else {
            projected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::halfedge::tests::cube;
    use crate::overlay::tests::uv_quad;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_polygonal_is_flat() {
        let (mut mesh, _, f) = uv_quad();
        let h = mesh.mesh().face_halfedges(f).next().unwrap();
        mesh.set_normal(h, Vector3::new(1.0, 0.0, 1.0)).unwrap();
        assert_relative_eq!(mesh.effective_normal(h), Vector3::z());
        mesh.set_shading(f, Shading::Smooth).unwrap();
        assert_relative_eq!(
            mesh.effective_normal(h),
            Vector3::new(1.0, 0.0, 1.0).normalize()
        );
    }

    #[test]
    fn test_smooth_falls_back_to_vertex_normal() {
        let (cube, v) = cube();
        let mut mesh = AttributedMesh::from(cube);
        mesh.set_face_shading_all(Shading::Smooth);
        let h = mesh.mesh().vertex_halfedges(v[6]).next().unwrap();
        let expected = Vector3::new(1.0, 1.0, 1.0).normalize();
        assert_relative_eq!(mesh.effective_normal(h), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_triangular_uses_corner_triangle() {
        let mut mesh = AttributedMesh::new();
        // Non-planar quad: the corner triangles disagree with each other
        let v: Vec<VertexId> = [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 1.0), (0.0, 1.0, 0.0)]
            .iter()
            .map(|&(x, y, z)| mesh.create_vertex(Point3::new(x, y, z)))
            .collect();
        let f = mesh.create_face(&v).unwrap();
        mesh.set_shading(f, Shading::Triangular).unwrap();
        let at_v0 = mesh.mesh().find_halfedge(v[3], v[0]).unwrap();
        assert_relative_eq!(mesh.effective_normal(at_v0), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_directional_keeps_one_direction_flat() {
        let (mut mesh, v, f) = uv_quad();
        // Normals tilted along x on the left and right edges
        let tilt = |x: f64| Vector3::new(x - 0.5, 0.0, 1.0).normalize();
        for &vertex in &v {
            let x = mesh.mesh().position(vertex).x;
            mesh.set_vertex_normal(vertex, tilt(x)).unwrap();
        }
        let at_v1 = mesh.mesh().find_halfedge(v[0], v[1]).unwrap();

        // Side 0 runs along x: the x tilt survives
        mesh.set_shading(f, Shading::DirectionalA).unwrap();
        assert_relative_eq!(mesh.effective_normal(at_v1), tilt(1.0), epsilon = 1e-12);

        // Sides 1 and 3 run along y: the x tilt is flattened away
        mesh.set_shading(f, Shading::DirectionalB).unwrap();
        assert_relative_eq!(mesh.effective_normal(at_v1), Vector3::z(), epsilon = 1e-12);
    }
}
