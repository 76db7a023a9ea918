// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Similarity fit of corner points onto target points

use crate::error::{MeshError, Result};
use log::warn;
use nalgebra::{
    Matrix3, Point3, Rotation3, Similarity3, Translation3, Unit, UnitQuaternion, Vector3,
};

/// Orthonormal frame with its first axis along `p1 - p0` and its third
/// axis normal to the plane through all three points
fn frame(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Option<Matrix3<f64>> {
    let e1 = (p1 - p0).try_normalize(f64::EPSILON)?;
    let e3 = e1.cross(&(p2 - p0)).try_normalize(f64::EPSILON)?;
    let e2 = e3.cross(&e1);
    Some(Matrix3::from_columns(&[e1, e2, e3]))
}

/// Rotation taking direction `from` onto direction `to`, including the
/// half turn for opposite directions
fn rotation_between(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(from, to).unwrap_or_else(|| {
        // Antiparallel: turn half way around any axis perpendicular to `from`
        let helper = if from.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let axis = Unit::new_normalize(from.cross(&helper));
        UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI)
    })
}

/// Similarity (rotation, uniform scale, translation) mapping `sources`
/// onto `targets` pairwise.
///
/// Uses the first target, the first target farther than `epsilon` from
/// it, and the first target after that which is not collinear with the two,
/// giving a 1-, 2- or 3-point fit. Any further targets are ignored; the
/// corresponding sources must be distinct in the same way.
pub fn fit_similarity(
    sources: &[Point3<f64>],
    targets: &[Point3<f64>],
    epsilon: f64,
) -> Result<Similarity3<f64>> {
    let count = sources.len().min(targets.len());
    if count == 0 {
        return Err(MeshError::invalid("auto_adjust", "no target points"));
    }
    let (s0, t0) = (sources[0], targets[0]);

    let Some(i1) = (1..count).find(|&i| (targets[i] - t0).norm() > epsilon) else {
        if count > 1 {
            warn!("auto_adjust: all targets coincide, translating only");
        }
        return Ok(Similarity3::from_parts(
            Translation3::from(t0 - s0),
            UnitQuaternion::identity(),
            1.0,
        ));
    };
    let (s1, t1) = (sources[i1], targets[i1]);
    let source_span = (s1 - s0).norm();
    if source_span <= epsilon {
        return Err(MeshError::invalid(
            "auto_adjust",
            "patch corners coincide where their targets do not",
        ));
    }
    let scale = (t1 - t0).norm() / source_span;

    let third = (i1 + 1..count).find(|&i| {
        (t1 - t0).cross(&(targets[i] - t0)).norm() > epsilon * (t1 - t0).norm()
    });
    let rotation = match third {
        Some(i2) => {
            let source = frame(&s0, &s1, &sources[i2]).ok_or_else(|| {
                MeshError::invalid(
                    "auto_adjust",
                    "patch corners are collinear where their targets are not",
                )
            })?;
            match frame(&t0, &t1, &targets[i2]) {
                Some(target) => UnitQuaternion::from_rotation_matrix(
                    &Rotation3::from_matrix_unchecked(target * source.transpose()),
                ),
                None => rotation_between(&(s1 - s0), &(t1 - t0)),
            }
        }
        None => rotation_between(&(s1 - s0), &(t1 - t0)),
    };

    // x -> t0 + scale * R * (x - s0)
    let translation = t0.coords - (rotation * s0.coords) * scale;
    Ok(Similarity3::from_parts(
        Translation3::from(translation),
        rotation,
        scale,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: f64) -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(size, 0.0, 0.0),
            Point3::new(size, size, 0.0),
            Point3::new(0.0, size, 0.0),
        ]
    }

    #[test]
    fn test_three_point_fit_onto_cube_face() {
        let targets = vec![
            Point3::new(-1.0, -1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
        ];
        let fit = fit_similarity(&square(1.0), &targets, 1e-9).unwrap();
        assert_relative_eq!(fit.scaling(), 2.0, epsilon = 1e-12);
        for (s, t) in square(1.0).iter().zip(&targets) {
            assert_relative_eq!(fit * s, *t, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_three_point_fit_with_rotation() {
        // Square stood up in the XZ plane facing -Y
        let targets = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let fit = fit_similarity(&square(1.0), &targets, 1e-9).unwrap();
        for (s, t) in square(1.0).iter().zip(&targets) {
            assert_relative_eq!(fit * s, *t, epsilon = 1e-12);
        }
        assert_relative_eq!(fit * Vector3::z(), -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_two_point_fit_when_collinear() {
        let sources = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let targets = vec![Point3::new(5.0, 0.0, 0.0), Point3::new(5.0, 3.0, 0.0), Point3::new(5.0, 6.0, 0.0)];
        let fit = fit_similarity(&sources, &targets, 1e-9).unwrap();
        assert_relative_eq!(fit.scaling(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(fit * sources[2], targets[2], epsilon = 1e-12);
    }

    #[test]
    fn test_two_point_fit_antiparallel() {
        let sources = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let targets = vec![Point3::origin(), Point3::new(-1.0, 0.0, 0.0)];
        let fit = fit_similarity(&sources, &targets, 1e-9).unwrap();
        assert_relative_eq!(fit * sources[1], targets[1], epsilon = 1e-12);
    }

    #[test]
    fn test_single_point_translates() {
        let fit = fit_similarity(&square(1.0), &[Point3::new(1.0, 2.0, 3.0)], 1e-9).unwrap();
        assert_relative_eq!(fit * Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 2.0, 3.0));
    }

    #[test]
    fn test_degenerate_sources() {
        let sources = vec![Point3::origin(), Point3::origin()];
        let targets = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert!(fit_similarity(&sources, &targets, 1e-9).is_err());
    }

    #[test]
    fn test_collinear_sources_with_planar_targets() {
        let sources = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let targets = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)];
        assert!(matches!(
            fit_similarity(&sources, &targets, 1e-9),
            Err(MeshError::InvalidTopologyOperation { .. })
        ));
    }
}
