// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Binary STL export and import

use crate::geometry::{Mesh, Triangle, Vertex};
use crate::utils::math::calculate_triangle_normal;
use anyhow::{Context, Result};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

/// Write `mesh` as binary STL.
///
/// Facet normals are taken from the triangle geometry; STL has no room for
/// per-vertex normals.
pub fn export(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let point = |index: usize| {
        let p = mesh.vertices[index].position.cast::<f32>();
        StlVertex::new([p.x, p.y, p.z])
    };
    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|triangle| {
            let [a, b, c] = triangle.indices;
            let n = calculate_triangle_normal(
                &mesh.vertices[a].position,
                &mesh.vertices[b].position,
                &mesh.vertices[c].position,
            )
            .cast::<f32>();
            StlTriangle {
                normal: Normal::new([n.x, n.y, n.z]),
                vertices: [point(a), point(b), point(c)],
            }
        })
        .collect();

    let file = File::create(path).with_context(|| format!("Failed to create {path:?}"))?;
    let mut out = BufWriter::new(file);
    stl_io::write_stl(&mut out, triangles.iter()).context("Failed to write STL")?;
    Ok(())
}

/// Load an STL file into a flat triangle mesh with facet normals
pub fn import(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let mut file = File::open(path).with_context(|| format!("Failed to open STL file: {path:?}"))?;
    let stl = stl_io::read_stl(&mut file).context("Failed to read STL file")?;

    let mut mesh = Mesh::with_capacity(stl.faces.len() * 3, stl.faces.len());
    for face in &stl.faces {
        let normal = Vector3::new(face.normal[0], face.normal[1], face.normal[2]).cast::<f64>();
        let indices = face.vertices.map(|index| {
            let v = &stl.vertices[index];
            let position = Point3::new(v[0], v[1], v[2]).cast::<f64>();
            mesh.add_vertex(Vertex::new(position, normal))
        });
        mesh.add_triangle(Triangle::new(indices));
    }
    Ok(mesh)
}
