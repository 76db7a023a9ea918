// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Attributed overlay on top of the half-edge kernel
//!
//! [`AttributedMesh`] owns a [`HalfEdgeMesh`] and keeps sparse per-corner and
//! per-face attribute maps next to it. A corner attribute stored on half-edge
//! `h` belongs to the corner at `h`'s head inside `h`'s face. Topology edits go
//! through the wrappers here, which delegate to the kernel and then migrate
//! attributes to the records that replaced the old ones.

mod export;
mod normals;

pub use export::ExportOptions;

use crate::error::{MeshError, Result};
use crate::geometry::{
    CombineMap, FaceId, HalfEdgeMesh, HalfedgeId, SpaceWarp, VertexId,
};
use nalgebra::{Matrix3, Matrix4, Point3, UnitQuaternion, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use std::fmt;
use std::str::FromStr;

/// How the normals of a face are derived at export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shading {
    /// Stored corner normals, falling back to averaged vertex normals
    Smooth,
    /// One flat normal for the whole face
    #[default]
    Polygonal,
    /// One flat normal per emitted triangle
    Triangular,
    /// Quads smooth along sides 0 and 2, flat across them
    DirectionalA,
    /// Quads smooth along sides 1 and 3, flat across them
    DirectionalB,
}

impl Shading {
    pub const ALL: [Shading; 5] = [
        Shading::Smooth,
        Shading::Polygonal,
        Shading::Triangular,
        Shading::DirectionalA,
        Shading::DirectionalB,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shading::Smooth => "smooth",
            Shading::Polygonal => "polygonal",
            Shading::Triangular => "triangular",
            Shading::DirectionalA => "directional_a",
            Shading::DirectionalB => "directional_b",
        }
    }
}

impl fmt::Display for Shading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shading {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Shading::ALL
            .into_iter()
            .find(|shading| shading.as_str() == s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown shading '{s}'"))
    }
}

/// Corner attributes carried together during migration
#[derive(Debug, Clone, Copy, Default)]
struct Corner {
    normal: Option<Vector3<f64>>,
    tangent: Option<Vector4<f64>>,
    uv: Option<Vector2<f64>>,
}

impl Corner {
    /// Interpolate towards `other`; a side missing a value takes the other's
    fn lerp(&self, other: &Corner, t: f64) -> Corner {
        fn mix<T: Copy>(a: Option<T>, b: Option<T>, f: impl Fn(T, T) -> T) -> Option<T> {
            match (a, b) {
                (Some(a), Some(b)) => Some(f(a, b)),
                (a, b) => a.or(b),
            }
        }
        Corner {
            normal: mix(self.normal, other.normal, |a, b| {
                a.lerp(&b, t).try_normalize(1e-12).unwrap_or(b)
            }),
            tangent: mix(self.tangent, other.tangent, |a, b| {
                let xyz = a.xyz().lerp(&b.xyz(), t);
                let xyz = xyz.try_normalize(1e-12).unwrap_or_else(|| b.xyz());
                Vector4::new(xyz.x, xyz.y, xyz.z, b.w)
            }),
            uv: mix(self.uv, other.uv, |a, b| a.lerp(&b, t)),
        }
    }
}

/// Half-edge mesh with per-corner normals, tangents and UVs and per-face
/// shading and surface groups
#[derive(Debug, Clone, Default)]
pub struct AttributedMesh {
    mesh: HalfEdgeMesh,
    normals: SecondaryMap<HalfedgeId, Vector3<f64>>,
    tangents: SecondaryMap<HalfedgeId, Vector4<f64>>,
    uvs: SecondaryMap<HalfedgeId, Vector2<f64>>,
    shading: SecondaryMap<FaceId, Shading>,
    surface_groups: SecondaryMap<FaceId, i32>,
}

impl From<HalfEdgeMesh> for AttributedMesh {
    fn from(mesh: HalfEdgeMesh) -> Self {
        Self {
            mesh,
            ..Self::default()
        }
    }
}

impl AttributedMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the underlying kernel mesh
    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    /// Drop all attributes and return the kernel mesh
    pub fn into_mesh(self) -> HalfEdgeMesh {
        self.mesh
    }

    pub fn create_vertex(&mut self, position: Point3<f64>) -> VertexId {
        self.mesh.create_vertex(position)
    }

    pub fn create_face(&mut self, vertices: &[VertexId]) -> Result<FaceId> {
        self.mesh.create_face(vertices)
    }

    pub fn set_position(&mut self, v: VertexId, position: Point3<f64>) -> Result<()> {
        self.mesh.ensure_vertex(v)?;
        self.mesh.set_position(v, position);
        Ok(())
    }

    // Attribute access

    pub fn normal(&self, h: HalfedgeId) -> Option<Vector3<f64>> {
        self.normals.get(h).copied()
    }

    pub fn set_normal(&mut self, h: HalfedgeId, normal: Vector3<f64>) -> Result<()> {
        self.mesh.ensure_halfedge(h)?;
        self.normals.insert(h, normal);
        Ok(())
    }

    pub fn tangent(&self, h: HalfedgeId) -> Option<Vector4<f64>> {
        self.tangents.get(h).copied()
    }

    /// Tangent in xyz, handedness of the bitangent in w
    pub fn set_tangent(&mut self, h: HalfedgeId, tangent: Vector4<f64>) -> Result<()> {
        self.mesh.ensure_halfedge(h)?;
        self.tangents.insert(h, tangent);
        Ok(())
    }

    pub fn uv(&self, h: HalfedgeId) -> Option<Vector2<f64>> {
        self.uvs.get(h).copied()
    }

    pub fn set_uv(&mut self, h: HalfedgeId, uv: Vector2<f64>) -> Result<()> {
        self.mesh.ensure_halfedge(h)?;
        self.uvs.insert(h, uv);
        Ok(())
    }

    /// Set the UV of every face corner at `v`
    pub fn set_vertex_uv(&mut self, v: VertexId, uv: Vector2<f64>) -> Result<()> {
        self.mesh.ensure_vertex(v)?;
        let corners: Vec<HalfedgeId> = self.face_corners(v);
        for h in corners {
            self.uvs.insert(h, uv);
        }
        Ok(())
    }

    /// Set the normal of every face corner at `v`
    pub fn set_vertex_normal(&mut self, v: VertexId, normal: Vector3<f64>) -> Result<()> {
        self.mesh.ensure_vertex(v)?;
        let corners: Vec<HalfedgeId> = self.face_corners(v);
        for h in corners {
            self.normals.insert(h, normal);
        }
        Ok(())
    }

    fn face_corners(&self, v: VertexId) -> Vec<HalfedgeId> {
        self.mesh
            .vertex_halfedges(v)
            .filter(|&h| !self.mesh.is_boundary_halfedge(h))
            .collect()
    }

    /// Shading of a face, [`Shading::Polygonal`] when unclassified
    pub fn shading(&self, f: FaceId) -> Shading {
        self.shading.get(f).copied().unwrap_or_default()
    }

    pub fn set_shading(&mut self, f: FaceId, shading: Shading) -> Result<()> {
        self.mesh.ensure_face(f)?;
        self.shading.insert(f, shading);
        Ok(())
    }

    pub fn set_face_shading_all(&mut self, shading: Shading) {
        for f in self.mesh.face_ids() {
            self.shading.insert(f, shading);
        }
    }

    pub fn surface_group(&self, f: FaceId) -> Option<i32> {
        self.surface_groups.get(f).copied()
    }

    pub fn set_surface_group(&mut self, f: FaceId, group: i32) -> Result<()> {
        self.mesh.ensure_face(f)?;
        self.surface_groups.insert(f, group);
        Ok(())
    }

    fn corner(&self, h: HalfedgeId) -> Corner {
        Corner {
            normal: self.normal(h),
            tangent: self.tangent(h),
            uv: self.uv(h),
        }
    }

    fn put_corner(&mut self, h: HalfedgeId, corner: Corner) {
        match corner.normal {
            Some(n) => self.normals.insert(h, n),
            None => self.normals.remove(h),
        };
        match corner.tangent {
            Some(t) => self.tangents.insert(h, t),
            None => self.tangents.remove(h),
        };
        match corner.uv {
            Some(uv) => self.uvs.insert(h, uv),
            None => self.uvs.remove(h),
        };
    }

    fn forget_halfedge(&mut self, h: HalfedgeId) -> Corner {
        Corner {
            normal: self.normals.remove(h),
            tangent: self.tangents.remove(h),
            uv: self.uvs.remove(h),
        }
    }

    fn forget_face(&mut self, f: FaceId) {
        self.shading.remove(f);
        self.surface_groups.remove(f);
    }

    // Topology wrappers

    /// See [`HalfEdgeMesh::connect_edges`]. Attributes of the two removed
    /// boundary half-edges are dropped.
    pub fn connect_edges(&mut self, e1: HalfedgeId, e2: HalfedgeId) -> Result<HalfedgeId> {
        let kept = self.mesh.connect_edges(e1, e2)?;
        self.forget_halfedge(e1);
        self.forget_halfedge(e2);
        Ok(kept)
    }

    /// See [`HalfEdgeMesh::disconnect_edge`]. Each new boundary half-edge
    /// inherits the tangent of the half-edge it replaces as its partner's
    /// opposite.
    pub fn disconnect_edge(&mut self, edge: HalfedgeId) -> Result<(HalfedgeId, HalfedgeId)> {
        self.mesh.ensure_halfedge(edge)?;
        let opposite = self.mesh.opposite(edge);
        let (new_h, new_o) = self.mesh.disconnect_edge(edge)?;
        if let Some(t) = self.tangent(opposite) {
            self.tangents.insert(new_h, t);
        }
        if let Some(t) = self.tangent(edge) {
            self.tangents.insert(new_o, t);
        }
        Ok((new_h, new_o))
    }

    /// See [`HalfEdgeMesh::merge_faces`]. The absorbed face's classification
    /// is dropped.
    pub fn merge_faces(&mut self, edge: HalfedgeId) -> Result<FaceId> {
        self.mesh.ensure_halfedge(edge)?;
        let opposite = self.mesh.opposite(edge);
        let absorbed = self.mesh.halfedge_face(opposite);
        let kept = self.mesh.merge_faces(edge)?;
        self.forget_halfedge(edge);
        self.forget_halfedge(opposite);
        if let Some(f) = absorbed.filter(|&f| f != kept) {
            self.forget_face(f);
        }
        Ok(kept)
    }

    /// See [`HalfEdgeMesh::split_face`]. The new face copies the shading and
    /// surface group; each new corner copies the corner at the same vertex.
    pub fn split_face(&mut self, v1: VertexId, v2: VertexId) -> Result<HalfedgeId> {
        let n = self.mesh.split_face(v1, v2)?;
        let m = self.mesh.opposite(n);
        let (at_v1, at_v2) = (self.mesh.prev(n), self.mesh.prev(m));
        self.put_corner(n, self.corner(at_v2));
        self.put_corner(m, self.corner(at_v1));

        if let (Some(old), Some(new)) = (self.mesh.halfedge_face(n), self.mesh.halfedge_face(m)) {
            if let Some(s) = self.shading.get(old).copied() {
                self.shading.insert(new, s);
            }
            if let Some(g) = self.surface_groups.get(old).copied() {
                self.surface_groups.insert(new, g);
            }
        }
        Ok(n)
    }

    pub fn split_edge(&mut self, edge: HalfedgeId) -> Result<VertexId> {
        self.split_edge_at(edge, 0.5)
    }

    /// See [`HalfEdgeMesh::split_edge_at`]. The far corners move to the new
    /// half-edges and the corners at the new vertex are interpolated.
    pub fn split_edge_at(&mut self, edge: HalfedgeId, t: f64) -> Result<VertexId> {
        self.mesh.ensure_halfedge(edge)?;
        let opposite = self.mesh.opposite(edge);
        // Corners at the tail side of each half, read before the split
        let near_h = self.near_corner(edge);
        let near_o = self.near_corner(opposite);
        let far_h = self.corner(edge);
        let far_o = self.corner(opposite);

        let middle = self.mesh.split_edge_at(edge, t)?;
        let continued_h = self.mesh.next(edge);
        let continued_o = self.mesh.next(opposite);

        self.put_corner(continued_h, far_h);
        self.put_corner(edge, near_h.lerp(&far_h, t));
        self.put_corner(continued_o, far_o);
        self.put_corner(opposite, near_o.lerp(&far_o, 1.0 - t));
        Ok(middle)
    }

    /// Corner at the tail of `h` within its face, empty on the boundary
    fn near_corner(&self, h: HalfedgeId) -> Corner {
        if self.mesh.is_boundary_halfedge(h) {
            Corner {
                tangent: self.tangent(h),
                ..Corner::default()
            }
        } else {
            self.corner(self.mesh.prev(h))
        }
    }

    /// See [`HalfEdgeMesh::merge_edges`]. The surviving half-edges take over
    /// the corners of the removed ones.
    pub fn merge_edges(&mut self, middle: VertexId) -> Result<HalfedgeId> {
        let chain = self.mesh.edge_chain(middle)?;
        let kept = self.mesh.merge_edges(middle)?;
        let far_first = self.forget_halfedge(chain.second);
        let far_second = self.forget_halfedge(chain.first_opposite);
        self.put_corner(chain.first, far_first);
        self.put_corner(chain.second_opposite, far_second);
        Ok(kept)
    }

    /// Move `other` into this mesh, carrying its attributes along
    pub fn combine(&mut self, other: AttributedMesh) -> CombineMap {
        let AttributedMesh {
            mesh,
            normals,
            tangents,
            uvs,
            shading,
            surface_groups,
        } = other;
        let map = self.mesh.combine_geometry(mesh);
        for (h, n) in normals {
            if let Some(id) = map.halfedge(h) {
                self.normals.insert(id, n);
            }
        }
        for (h, t) in tangents {
            if let Some(id) = map.halfedge(h) {
                self.tangents.insert(id, t);
            }
        }
        for (h, uv) in uvs {
            if let Some(id) = map.halfedge(h) {
                self.uvs.insert(id, uv);
            }
        }
        for (f, s) in shading {
            if let Some(id) = map.face(f) {
                self.shading.insert(id, s);
            }
        }
        for (f, g) in surface_groups {
            if let Some(id) = map.face(f) {
                self.surface_groups.insert(id, g);
            }
        }
        map
    }

    // Transforms

    pub fn apply_offset(&mut self, offset: &Vector3<f64>) {
        self.mesh.apply_offset(offset);
    }

    pub fn apply_rotation(&mut self, rotation: &UnitQuaternion<f64>) {
        self.mesh.apply_rotation(rotation);
        let matrix = rotation.to_rotation_matrix().into_inner();
        self.transform_directions(&matrix, &matrix);
    }

    /// Per-axis scale; a zero component is rejected as singular
    pub fn apply_scale(&mut self, scale: &Vector3<f64>) -> Result<()> {
        self.apply_linear_transform(&Matrix4::new_nonuniform_scaling(scale))
    }

    /// Affine transform. Normals use the inverse transpose of the linear
    /// part, tangents the linear part itself.
    pub fn apply_linear_transform(&mut self, matrix: &Matrix4<f64>) -> Result<()> {
        let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let inverse = linear.try_inverse().ok_or(MeshError::SingularTransform {
            determinant: linear.determinant(),
        })?;
        self.mesh.apply_linear_transform(matrix);
        self.transform_directions(&inverse.transpose(), &linear);
        Ok(())
    }

    /// Positions only; attributes are left as they are
    pub fn apply_position_transform<F>(&mut self, transform: F)
    where
        F: FnMut(&Point3<f64>) -> Point3<f64>,
    {
        self.mesh.apply_position_transform(transform);
    }

    /// Warp positions, normals and tangents. Every attribute is evaluated at
    /// the pre-warp position of its corner before anything is written, so a
    /// singular Jacobian leaves the mesh unchanged.
    pub fn apply_space_warp(&mut self, warp: &dyn SpaceWarp) -> Result<()> {
        let mut normals = Vec::with_capacity(self.normals.len());
        for (h, n) in &self.normals {
            let p = self.mesh.position(self.mesh.head(h));
            normals.push((h, warp.evaluate_normal(&p, n)?));
        }
        let mut tangents = Vec::with_capacity(self.tangents.len());
        for (h, t) in &self.tangents {
            let p = self.mesh.position(self.mesh.head(h));
            let warped = warp.evaluate_tangent(&p, &t.xyz())?;
            let warped = warped.try_normalize(1e-12).unwrap_or(warped);
            tangents.push((h, Vector4::new(warped.x, warped.y, warped.z, t.w)));
        }

        self.mesh.apply_space_warp(warp);
        self.normals.extend(normals);
        self.tangents.extend(tangents);
        Ok(())
    }

    fn transform_directions(&mut self, normal_matrix: &Matrix3<f64>, tangent_matrix: &Matrix3<f64>) {
        for n in self.normals.values_mut() {
            let transformed = normal_matrix * *n;
            *n = transformed.try_normalize(1e-12).unwrap_or(transformed);
        }
        for t in self.tangents.values_mut() {
            let xyz = tangent_matrix * t.xyz();
            let xyz = xyz.try_normalize(1e-12).unwrap_or(xyz);
            *t = Vector4::new(xyz.x, xyz.y, xyz.z, t.w);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit quad in the XY plane with UVs equal to the XY coordinates
    pub(crate) fn uv_quad() -> (AttributedMesh, Vec<VertexId>, FaceId) {
        let mut mesh = AttributedMesh::new();
        let v: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| mesh.create_vertex(Point3::new(x, y, 0.0)))
            .collect();
        let f = mesh.create_face(&v).unwrap();
        for &vertex in &v {
            let p = mesh.mesh().position(vertex);
            mesh.set_vertex_uv(vertex, Vector2::new(p.x, p.y)).unwrap();
            mesh.set_vertex_normal(vertex, Vector3::z()).unwrap();
        }
        (mesh, v, f)
    }

    fn corner_uv(mesh: &AttributedMesh, f: FaceId, v: VertexId) -> Vector2<f64> {
        let h = mesh
            .mesh()
            .face_halfedges(f)
            .find(|&h| mesh.mesh().head(h) == v)
            .unwrap();
        mesh.uv(h).unwrap()
    }

    #[test]
    fn test_shading_parse_and_default() {
        assert_eq!(Shading::default(), Shading::Polygonal);
        assert_eq!("Directional_B".parse::<Shading>(), Ok(Shading::DirectionalB));
        assert!("glossy".parse::<Shading>().is_err());
        for shading in Shading::ALL {
            assert_eq!(shading.to_string().parse::<Shading>(), Ok(shading));
        }
    }

    #[test]
    fn test_split_edge_interpolates_uv() {
        let (mut mesh, v, f) = uv_quad();
        let h = mesh.mesh().find_halfedge(v[0], v[1]).unwrap();
        let m = mesh.split_edge_at(h, 0.25).unwrap();
        mesh.mesh().check_invariants().unwrap();
        assert_relative_eq!(corner_uv(&mesh, f, m), Vector2::new(0.25, 0.0));
        assert_relative_eq!(corner_uv(&mesh, f, v[1]), Vector2::new(1.0, 0.0));
        assert_relative_eq!(corner_uv(&mesh, f, v[0]), Vector2::new(0.0, 0.0));
    }

    #[test]
    fn test_merge_edges_restores_corners() {
        let (mut mesh, v, f) = uv_quad();
        let h = mesh.mesh().find_halfedge(v[1], v[2]).unwrap();
        let m = mesh.split_edge(h).unwrap();
        mesh.merge_edges(m).unwrap();
        mesh.mesh().check_invariants().unwrap();
        for &vertex in &v {
            let p = mesh.mesh().position(vertex);
            assert_relative_eq!(corner_uv(&mesh, f, vertex), Vector2::new(p.x, p.y));
        }
    }

    #[test]
    fn test_split_face_copies_classification() {
        let (mut mesh, v, f) = uv_quad();
        mesh.set_shading(f, Shading::Smooth).unwrap();
        mesh.set_surface_group(f, 7).unwrap();
        let n = mesh.split_face(v[0], v[2]).unwrap();
        let g = mesh.mesh().halfedge_face(mesh.mesh().opposite(n)).unwrap();
        assert_ne!(f, g);
        assert_eq!(mesh.shading(g), Shading::Smooth);
        assert_eq!(mesh.surface_group(g), Some(7));
        for face in [f, g] {
            for vertex in mesh.mesh().face_vertices(face) {
                let p = mesh.mesh().position(vertex);
                assert_relative_eq!(corner_uv(&mesh, face, vertex), Vector2::new(p.x, p.y));
            }
        }
    }

    #[test]
    fn test_linear_transform_renormalises_normals() {
        let (mut mesh, v, f) = uv_quad();
        let shear = Matrix4::new(
            1.0, 0.0, 1.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 2.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        mesh.apply_linear_transform(&shear).unwrap();
        let h = mesh.mesh().face_halfedges(f).next().unwrap();
        let n = mesh.normal(h).unwrap();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        // Still perpendicular to the transformed face
        let e = mesh.mesh().position(v[1]) - mesh.mesh().position(v[0]);
        assert_relative_eq!(n.dot(&e), 0.0, epsilon = 1e-12);

        let flatten = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 1.0, 0.0));
        assert!(matches!(
            mesh.apply_linear_transform(&flatten),
            Err(MeshError::SingularTransform { .. })
        ));
    }

    #[test]
    fn test_combine_carries_attributes() {
        let (mut mesh, _, _) = uv_quad();
        let (other, ov, of) = uv_quad();
        let map = mesh.combine(other);
        let f = map.face(of).unwrap();
        let v2 = map.vertex(ov[2]).unwrap();
        assert_relative_eq!(corner_uv(&mesh, f, v2), Vector2::new(1.0, 1.0));
        assert_eq!(mesh.mesh().face_count(), 2);
    }
}
