// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric transforms of vertex positions and the space warp seam

use super::HalfEdgeMesh;
use crate::error::{MeshError, Result};
use nalgebra::{Matrix3, Matrix4, Point3, UnitQuaternion, Vector3};

/// Determinants at or below this magnitude are treated as singular
const SINGULAR_DETERMINANT: f64 = 1e-12;

/// A smooth non-linear deformation of space.
///
/// Tangents and normals are pushed through the local derivative at the
/// *pre-warp* position: tangents by the Jacobian, normals by its inverse
/// transpose.
pub trait SpaceWarp {
    fn evaluate(&self, position: &Point3<f64>) -> Point3<f64>;

    fn evaluate_tangent(&self, position: &Point3<f64>, tangent: &Vector3<f64>)
        -> Result<Vector3<f64>>;

    fn evaluate_normal(&self, position: &Point3<f64>, normal: &Vector3<f64>)
        -> Result<Vector3<f64>>;
}

/// Closure-backed warp with a central-difference Jacobian
pub struct JacobianWarp<F> {
    function: F,
    step: f64,
}

impl<F> JacobianWarp<F>
where
    F: Fn(&Point3<f64>) -> Point3<f64>,
{
    pub fn new(function: F) -> Self {
        Self {
            function,
            step: 1e-5,
        }
    }

    /// Finite difference step used for the Jacobian
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Column `i` holds the derivative of the warp along axis `i`
    pub fn jacobian(&self, position: &Point3<f64>) -> Matrix3<f64> {
        let mut jacobian = Matrix3::zeros();
        for axis in 0..3 {
            let mut offset = Vector3::zeros();
            offset[axis] = self.step;
            let forward = (self.function)(&(position + offset));
            let backward = (self.function)(&(position - offset));
            jacobian.set_column(axis, &((forward - backward) / (2.0 * self.step)));
        }
        jacobian
    }

    fn checked_jacobian(&self, position: &Point3<f64>) -> Result<Matrix3<f64>> {
        let jacobian = self.jacobian(position);
        let determinant = jacobian.determinant();
        if determinant.abs() <= SINGULAR_DETERMINANT || !determinant.is_finite() {
            return Err(MeshError::SingularTransform { determinant });
        }
        Ok(jacobian)
    }
}

impl<F> SpaceWarp for JacobianWarp<F>
where
    F: Fn(&Point3<f64>) -> Point3<f64>,
{
    fn evaluate(&self, position: &Point3<f64>) -> Point3<f64> {
        (self.function)(position)
    }

    fn evaluate_tangent(
        &self,
        position: &Point3<f64>,
        tangent: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        Ok(self.checked_jacobian(position)? * tangent)
    }

    fn evaluate_normal(
        &self,
        position: &Point3<f64>,
        normal: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let jacobian = self.checked_jacobian(position)?;
        let inverse = jacobian.try_inverse().ok_or(MeshError::SingularTransform {
            determinant: jacobian.determinant(),
        })?;
        Ok((inverse.transpose() * normal).normalize())
    }
}

impl HalfEdgeMesh {
    pub fn apply_offset(&mut self, offset: &Vector3<f64>) {
        self.apply_position_transform(|p| p + offset);
    }

    pub fn apply_rotation(&mut self, rotation: &UnitQuaternion<f64>) {
        self.apply_position_transform(|p| rotation * p);
    }

    /// Per-axis scale about the origin
    pub fn apply_scale(&mut self, scale: &Vector3<f64>) {
        self.apply_position_transform(|p| Point3::from(p.coords.component_mul(scale)));
    }

    /// Affine transform given as a homogeneous matrix
    pub fn apply_linear_transform(&mut self, matrix: &Matrix4<f64>) {
        self.apply_position_transform(|p| matrix.transform_point(p));
    }

    pub fn apply_position_transform<F>(&mut self, mut transform: F)
    where
        F: FnMut(&Point3<f64>) -> Point3<f64>,
    {
        for vertex in self.vertices.values_mut() {
            vertex.position = transform(&vertex.position);
        }
    }

    /// Move every vertex through the warp (positions only)
    pub fn apply_space_warp(&mut self, warp: &dyn SpaceWarp) {
        self.apply_position_transform(|p| warp.evaluate(p));
    }
}
