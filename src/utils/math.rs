// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point3, Vector2, Vector3};

/// Unnormalized polygon normal by Newell's method.
///
/// The length of the result is twice the polygon area, which makes it usable
/// as an area weight.
pub fn newell_normal<'a, I>(points: I) -> Vector3<f64>
where
    I: IntoIterator<Item = &'a Point3<f64>>,
    I::IntoIter: Clone,
{
    let iter = points.into_iter();
    let mut normal = Vector3::zeros();
    let mut next = iter.clone().cycle().skip(1);
    for current in iter {
        let Some(following) = next.next() else {
            break;
        };
        normal.x += (current.y - following.y) * (current.z + following.z);
        normal.y += (current.z - following.z) * (current.x + following.x);
        normal.z += (current.x - following.x) * (current.y + following.y);
    }
    normal
}

/// Calculate the normal of a triangle given three vertices
pub fn calculate_triangle_normal(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> Vector3<f64> {
    let v1 = p1 - p0;
    let v2 = p2 - p0;
    normalize_or_zero(&v1.cross(&v2))
}

/// Normalize, returning zero for (near) zero-length input instead of NaN
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
}

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Component-wise approximate equality of two 3-vectors
pub fn approx_eq_vec3(a: &Vector3<f64>, b: &Vector3<f64>, epsilon: f64) -> bool {
    approx_eq(a.x, b.x, epsilon) && approx_eq(a.y, b.y, epsilon) && approx_eq(a.z, b.z, epsilon)
}

/// Component-wise approximate equality of two 2-vectors
pub fn approx_eq_vec2(a: &Vector2<f64>, b: &Vector2<f64>, epsilon: f64) -> bool {
    approx_eq(a.x, b.x, epsilon) && approx_eq(a.y, b.y, epsilon)
}
