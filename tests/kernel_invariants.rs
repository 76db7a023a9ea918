// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structural invariants of the half-edge kernel

use anyhow::Result;
use hemesh::{FaceId, HalfEdgeMesh, HalfedgeId, MeshError, VertexId};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn cube() -> Result<(HalfEdgeMesh, Vec<VertexId>)> {
    let positions: Vec<Point3<f64>> = (0..8)
        .map(|i| {
            let x = if i & 1 == 0 { -1.0 } else { 1.0 };
            let y = if i & 2 == 0 { -1.0 } else { 1.0 };
            let z = if i & 4 == 0 { -1.0 } else { 1.0 };
            Point3::new(x, y, z)
        })
        .collect();
    let polygons = vec![
        vec![0, 2, 3, 1],
        vec![4, 5, 7, 6],
        vec![0, 1, 5, 4],
        vec![2, 6, 7, 3],
        vec![0, 4, 6, 2],
        vec![1, 3, 7, 5],
    ];
    Ok(HalfEdgeMesh::from_polygons(&positions, &polygons)?)
}

/// Quad grid of `n x n` cells over the unit square
fn grid(n: usize) -> Result<HalfEdgeMesh> {
    let mut positions = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            positions.push(Point3::new(i as f64 / n as f64, j as f64 / n as f64, 0.0));
        }
    }
    let at = |i: usize, j: usize| j * (n + 1) + i;
    let mut polygons = Vec::new();
    for j in 0..n {
        for i in 0..n {
            polygons.push(vec![at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)]);
        }
    }
    Ok(HalfEdgeMesh::from_polygons(&positions, &polygons)?.0)
}

fn assert_structure(mesh: &HalfEdgeMesh) {
    for h in mesh.halfedge_ids() {
        let o = mesh.opposite(h);
        assert_eq!(mesh.opposite(o), h);
        assert_eq!(mesh.head(o), mesh.tail(h));
        assert_eq!(mesh.prev(mesh.next(h)), h);
    }
    for f in mesh.face_ids() {
        let start = mesh.face(f).map(|face| face.halfedge()).unwrap();
        let count = mesh.face_edge_count(f);
        let mut h = start;
        for _ in 0..count {
            assert_eq!(mesh.halfedge_face(h), Some(f));
            h = mesh.next(h);
        }
        assert_eq!(h, start);
        for _ in 0..count {
            h = mesh.prev(h);
        }
        assert_eq!(h, start);
    }
}

#[test]
fn test_cube_euler_characteristic() -> Result<()> {
    let (mesh, _) = cube()?;
    mesh.check_invariants()?;
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.edge_count(), 12);
    assert_eq!(mesh.face_count(), 6);
    assert_eq!(mesh.euler_characteristic(), 2);
    assert_structure(&mesh);
    Ok(())
}

#[test]
fn test_grid_structure() -> Result<()> {
    let mesh = grid(4)?;
    mesh.check_invariants()?;
    assert_structure(&mesh);
    assert_eq!(mesh.euler_characteristic(), 1);
    assert_eq!(mesh.boundary_halfedges().len(), 16);
    Ok(())
}

#[test]
fn test_disconnect_connect_round_trip() -> Result<()> {
    let (mut mesh, v) = cube()?;
    let h = mesh.find_halfedge(v[0], v[1]).unwrap();
    let o = mesh.opposite(h);
    let faces = (mesh.halfedge_face(h), mesh.halfedge_face(o));

    let (new_h, new_o) = mesh.disconnect_edge(h)?;
    mesh.check_invariants()?;
    assert_eq!(mesh.boundary_halfedges().len(), 2);

    let kept = mesh.connect_edges(new_h, new_o)?;
    mesh.check_invariants()?;
    assert_eq!(kept, h);
    assert_eq!(mesh.opposite(h), o);
    assert_eq!((mesh.halfedge_face(h), mesh.halfedge_face(o)), faces);
    assert_eq!(mesh.position(mesh.tail(h)), Point3::new(-1.0, -1.0, -1.0));
    assert_eq!(mesh.position(mesh.head(h)), Point3::new(1.0, -1.0, -1.0));
    assert!(mesh.boundary_halfedges().is_empty());
    Ok(())
}

#[test]
fn test_split_merge_round_trip() -> Result<()> {
    let (mut mesh, v) = cube()?;
    let counts = (mesh.vertex_count(), mesh.halfedge_count(), mesh.face_count());
    let h = mesh.find_halfedge(v[3], v[7]).unwrap();
    let m = mesh.split_edge(h)?;
    assert_eq!(mesh.position(m), Point3::new(1.0, 1.0, 0.0));
    mesh.merge_edges(m)?;
    mesh.check_invariants()?;
    assert_eq!(
        (mesh.vertex_count(), mesh.halfedge_count(), mesh.face_count()),
        counts
    );
    assert!(mesh.find_halfedge(v[3], v[7]).is_some());
    Ok(())
}

/// A reversible edit applied by the randomized test
enum Edit {
    SplitEdge(VertexId),
    SplitFace(HalfedgeId),
}

/// Corner pairs of `f` that `split_face` accepts
fn diagonals(mesh: &HalfEdgeMesh, f: FaceId) -> Vec<(VertexId, VertexId)> {
    let corners = mesh.face_vertices(f);
    let n = corners.len();
    let mut pairs = Vec::new();
    for i in 0..n {
        for j in i + 2..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a, c) = (corners[i], corners[j]);
            let shared = mesh
                .vertex_faces(a)
                .filter(|&g| mesh.vertex_faces(c).any(|x| x == g))
                .count();
            if shared == 1 && mesh.find_halfedge(a, c).is_none() {
                pairs.push((a, c));
            }
        }
    }
    pairs
}

#[test]
fn test_randomized_split_merge() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut mesh = grid(3)?;
    let counts = (mesh.vertex_count(), mesh.halfedge_count(), mesh.face_count());

    let mut edits = Vec::new();
    for _ in 0..40 {
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let f = faces[rng.gen_range(0..faces.len())];
        let pairs = diagonals(&mesh, f);
        if !pairs.is_empty() && rng.gen_bool(0.4) {
            let (a, c) = pairs[rng.gen_range(0..pairs.len())];
            edits.push(Edit::SplitFace(mesh.split_face(a, c)?));
        } else {
            let ring: Vec<HalfedgeId> = mesh.face_halfedges(f).collect();
            let h = ring[rng.gen_range(0..ring.len())];
            edits.push(Edit::SplitEdge(mesh.split_edge_at(h, rng.gen_range(0.1..0.9))?));
        }
        mesh.check_invariants()?;
        assert_eq!(mesh.euler_characteristic(), 1);
    }

    for edit in edits.into_iter().rev() {
        match edit {
            Edit::SplitEdge(m) => mesh.merge_edges(m).map(|_| ())?,
            Edit::SplitFace(n) => mesh.merge_faces(n).map(|_| ())?,
        }
        mesh.check_invariants()?;
    }
    assert_eq!(
        (mesh.vertex_count(), mesh.halfedge_count(), mesh.face_count()),
        counts
    );
    assert_structure(&mesh);
    Ok(())
}

#[test]
fn test_import_rejects_non_manifold() {
    let positions = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ];
    // Three triangles on the edge 0-1, two of them using 0 -> 1
    let polygons = vec![vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4]];
    assert!(matches!(
        HalfEdgeMesh::from_polygons(&positions, &polygons),
        Err(MeshError::NonManifoldGeometry { from: 0, to: 1 })
    ));
}

#[test]
fn test_stale_handles_are_rejected() -> Result<()> {
    let (mut mesh, v) = cube()?;
    let h = mesh.find_halfedge(v[0], v[1]).unwrap();
    let m = mesh.split_edge(h)?;
    mesh.merge_edges(m)?;
    assert!(!mesh.contains_vertex(m));
    assert!(matches!(mesh.merge_edges(m), Err(MeshError::StaleHandle(_))));
    Ok(())
}
