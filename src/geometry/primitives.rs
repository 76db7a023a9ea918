// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::{HalfEdgeMesh, Mesh, VertexId};
use crate::compose::{Patch, Scaffold};
use crate::error::{MeshError, Result};
use crate::overlay::{AttributedMesh, ExportOptions};
use nalgebra::{Point3, Vector2, Vector3};
use std::f64::consts::TAU;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Quad grid in the XY plane with its corner at the origin
    Grid { size: Vector2<f64>, segments: [usize; 2] },
    /// Box centered on the origin, welded from one grid patch per side
    Box { size: Vector3<f64>, segments: [usize; 3] },
    /// Open cone of triangles around a shared apex
    ApexFan { sides: usize, radius: f64, height: f64 },
}

impl Primitive {
    pub fn grid(size: Vector2<f64>, segments: [usize; 2]) -> Self {
        Self::Grid { size, segments }
    }

    pub fn box_(size: Vector3<f64>, segments: [usize; 3]) -> Self {
        Self::Box { size, segments }
    }

    pub fn apex_fan(sides: usize, radius: f64, height: f64) -> Self {
        Self::ApexFan {
            sides,
            radius,
            height,
        }
    }

    pub fn to_attributed_mesh(&self) -> Result<AttributedMesh> {
        match self {
            Self::Grid { size, segments } => {
                let (mesh, _) = grid_patch(*size, *segments)?.into_parts();
                Ok(mesh)
            }
            Self::Box { size, segments } => generate_box(*size, *segments),
            Self::ApexFan {
                sides,
                radius,
                height,
            } => Ok(generate_apex_fan(*sides, *radius, *height)?.into()),
        }
    }

    pub fn to_mesh(&self, options: &ExportOptions) -> Result<Mesh> {
        Ok(self.to_attributed_mesh()?.to_mesh(options))
    }
}

/// Grid patch of `segments[0] x segments[1]` quads covering `size`.
///
/// Normals point along +Z, UVs run from 0 to 1 across the grid and the four
/// outer corners are the patch corners, starting at the origin.
pub fn grid_patch(size: Vector2<f64>, segments: [usize; 2]) -> Result<Patch> {
    let [nu, nv] = segments;
    if nu == 0 || nv == 0 {
        return Err(MeshError::invalid(
            "grid_patch",
            format!("need at least one segment per axis, got {nu}x{nv}"),
        ));
    }

    let mut mesh = AttributedMesh::new();
    let mut grid: Vec<VertexId> = Vec::with_capacity((nu + 1) * (nv + 1));
    for j in 0..=nv {
        for i in 0..=nu {
            let uv = Vector2::new(i as f64 / nu as f64, j as f64 / nv as f64);
            grid.push(mesh.create_vertex(Point3::new(uv.x * size.x, uv.y * size.y, 0.0)));
        }
    }
    let at = |i: usize, j: usize| grid[j * (nu + 1) + i];

    for j in 0..nv {
        for i in 0..nu {
            mesh.create_face(&[at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)])?;
        }
    }
    for j in 0..=nv {
        for i in 0..=nu {
            let uv = Vector2::new(i as f64 / nu as f64, j as f64 / nv as f64);
            mesh.set_vertex_uv(at(i, j), uv)?;
            mesh.set_vertex_normal(at(i, j), Vector3::z())?;
        }
    }

    let mut patch = Patch::new(mesh);
    patch.define_boundaries(&[at(0, 0), at(nu, 0), at(nu, nv), at(0, nv)])?;
    Ok(patch)
}

fn generate_box(size: Vector3<f64>, segments: [usize; 3]) -> Result<AttributedMesh> {
    let half = size / 2.0;
    let mut mesh = HalfEdgeMesh::new();

    // 8 corners of the box
    let corners: Vec<VertexId> = [
        (-1.0, -1.0, -1.0),
        (1.0, -1.0, -1.0),
        (1.0, 1.0, -1.0),
        (-1.0, 1.0, -1.0),
        (-1.0, -1.0, 1.0),
        (1.0, -1.0, 1.0),
        (1.0, 1.0, 1.0),
        (-1.0, 1.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| mesh.create_vertex(Point3::new(x * half.x, y * half.y, z * half.z)))
    .collect();

    // 6 sides, wound outward
    for quad in [
        [0, 3, 2, 1], // Bottom (z-)
        [4, 5, 6, 7], // Top (z+)
        [0, 1, 5, 4], // Front (y-)
        [2, 3, 7, 6], // Back (y+)
        [0, 4, 7, 3], // Left (x-)
        [1, 2, 6, 5], // Right (x+)
    ] {
        mesh.create_face(&quad.map(|i| corners[i]))?;
    }

    let mut scaffold = Scaffold::new(mesh);
    let faces: Vec<_> = scaffold.mesh().face_ids().collect();
    for face in faces {
        let sides: Vec<Vector3<f64>> = scaffold
            .mesh()
            .face_halfedges(face)
            .map(|h| scaffold.mesh().halfedge_vector(h))
            .collect();
        let (u, v) = (&sides[0], &sides[1]);
        let patch = grid_patch(
            Vector2::new(u.norm(), v.norm()),
            [segments[dominant_axis(u)], segments[dominant_axis(v)]],
        )?;
        scaffold.set_face_component(face, patch)?;
    }
    scaffold.build()
}

fn dominant_axis(v: &Vector3<f64>) -> usize {
    v.abs().imax()
}

fn generate_apex_fan(sides: usize, radius: f64, height: f64) -> Result<HalfEdgeMesh> {
    if sides < 3 {
        return Err(MeshError::invalid(
            "apex_fan",
            format!("need at least 3 sides, got {sides}"),
        ));
    }

    let mut mesh = HalfEdgeMesh::new();
    let apex = mesh.create_vertex(Point3::new(0.0, 0.0, height));
    let rim: Vec<VertexId> = (0..sides)
        .map(|k| {
            let angle = k as f64 * TAU / sides as f64;
            mesh.create_vertex(Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0))
        })
        .collect();

    // Even triangles first so the odd ones close gaps between separate fans
    for k in (0..sides).step_by(2).chain((1..sides).step_by(2)) {
        mesh.create_face(&[apex, rim[k], rim[(k + 1) % sides]])?;
    }
    Ok(mesh)
}
