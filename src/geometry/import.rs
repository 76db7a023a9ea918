// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Building a half-edge mesh from indexed polygon soups

use super::{HalfEdgeMesh, Mesh, VertexId};
use crate::error::{MeshError, Result};
use ahash::{AHashMap, AHashSet};
use log::{debug, warn};
use nalgebra::Point3;

impl HalfEdgeMesh {
    /// Build a mesh from positions and counter-clockwise index polygons.
    ///
    /// Returns the mesh together with the handle of each input position. A
    /// directed edge used by two polygons (an edge shared by three or more
    /// faces, or neighbours with inconsistent winding) is rejected before
    /// anything is built.
    pub fn from_polygons(
        positions: &[Point3<f64>],
        polygons: &[Vec<usize>],
    ) -> Result<(Self, Vec<VertexId>)> {
        let mut directed: AHashSet<(usize, usize)> = AHashSet::new();
        for polygon in polygons {
            if polygon.len() < 3 {
                return Err(MeshError::invalid(
                    "from_polygons",
                    format!("polygon with {} vertices", polygon.len()),
                ));
            }
            for (i, &from) in polygon.iter().enumerate() {
                let to = polygon[(i + 1) % polygon.len()];
                if from >= positions.len() || to >= positions.len() {
                    return Err(MeshError::invalid(
                        "from_polygons",
                        format!("index out of range ({} positions)", positions.len()),
                    ));
                }
                if !directed.insert((from, to)) {
                    return Err(MeshError::NonManifoldGeometry { from, to });
                }
            }
        }

        let mut mesh = Self::new();
        let handles: Vec<VertexId> = positions.iter().map(|&p| mesh.create_vertex(p)).collect();
        let mut corners = Vec::new();
        for polygon in polygons {
            corners.clear();
            corners.extend(polygon.iter().map(|&i| handles[i]));
            mesh.create_face(&corners)?;
        }
        debug!(
            "from_polygons: {} vertices, {} faces, {} edges",
            mesh.vertex_count(),
            mesh.face_count(),
            mesh.edge_count()
        );
        Ok((mesh, handles))
    }

    /// Build a mesh from a triangle mesh, welding positions closer than
    /// `weld_epsilon`. Triangles that collapse after welding are skipped.
    pub fn from_triangle_mesh(mesh: &Mesh, weld_epsilon: f64) -> Result<Self> {
        let (positions, remap) = weld_positions(mesh, weld_epsilon);
        let mut polygons = Vec::with_capacity(mesh.triangles.len());
        for triangle in &mesh.triangles {
            let [a, b, c] = triangle.indices.map(|i| remap[i]);
            if a == b || b == c || c == a {
                warn!("from_triangle_mesh: skipping degenerate triangle {:?}", triangle.indices);
                continue;
            }
            polygons.push(vec![a, b, c]);
        }
        Ok(Self::from_polygons(&positions, &polygons)?.0)
    }
}

/// Merge positions on a hash grid with cell size `epsilon`
fn weld_positions(mesh: &Mesh, epsilon: f64) -> (Vec<Point3<f64>>, Vec<usize>) {
    let epsilon = epsilon.max(f64::MIN_POSITIVE);
    let cell = |p: &Point3<f64>| {
        (
            (p.x / epsilon).floor() as i64,
            (p.y / epsilon).floor() as i64,
            (p.z / epsilon).floor() as i64,
        )
    };

    let mut grid: AHashMap<(i64, i64, i64), Vec<usize>> = AHashMap::new();
    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut remap = Vec::with_capacity(mesh.vertices.len());

    for vertex in &mesh.vertices {
        let p = vertex.position;
        let (cx, cy, cz) = cell(&p);
        let mut found = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    if let Some(&index) = bucket
                        .iter()
                        .find(|&&index| (positions[index] - p).norm() < epsilon)
                    {
                        found = Some(index);
                        break 'search;
                    }
                }
            }
        }
        let index = found.unwrap_or_else(|| {
            positions.push(p);
            grid.entry((cx, cy, cz)).or_default().push(positions.len() - 1);
            positions.len() - 1
        });
        remap.push(index);
    }

    (positions, remap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Triangle, Vertex};
    use nalgebra::Vector3;

    fn cube_polygons() -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        let positions = vec![
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
        ];
        let polygons = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![2, 3, 7, 6],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
        ];
        (positions, polygons)
    }

    #[test]
    fn test_from_polygons_cube() {
        let (positions, polygons) = cube_polygons();
        let (mesh, handles) = HalfEdgeMesh::from_polygons(&positions, &polygons).unwrap();
        assert_eq!(handles.len(), 8);
        assert_eq!(mesh.euler_characteristic(), 2);
        mesh.check_invariants().unwrap();
    }

    #[test]
    fn test_inconsistent_winding_is_non_manifold() {
        let (positions, mut polygons) = cube_polygons();
        polygons[1].reverse();
        assert!(matches!(
            HalfEdgeMesh::from_polygons(&positions, &polygons),
            Err(MeshError::NonManifoldGeometry { .. })
        ));
    }

    #[test]
    fn test_three_faces_on_one_edge() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let polygons = vec![vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4]];
        assert!(matches!(
            HalfEdgeMesh::from_polygons(&positions, &polygons),
            Err(MeshError::NonManifoldGeometry { from: 0, to: 1 })
        ));
    }

    #[test]
    fn test_from_triangle_mesh_welds_seams() {
        // Two triangles of a unit square with their shared corners duplicated
        let mut soup = Mesh::new();
        for p in [
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 0.0),
            (1.0, 1.0 + 1e-9),
            (0.0, 1.0),
        ] {
            soup.add_vertex(Vertex::new(Point3::new(p.0, p.1, 0.0), Vector3::z()));
        }
        soup.add_triangle(Triangle::new([0, 1, 2]));
        soup.add_triangle(Triangle::new([3, 4, 5]));

        let mesh = HalfEdgeMesh::from_triangle_mesh(&soup, 1e-6).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.edge_count(), 5);
        assert_eq!(mesh.face_count(), 2);
        mesh.check_invariants().unwrap();
    }
}
