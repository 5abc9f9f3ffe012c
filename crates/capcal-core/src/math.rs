//! Mathematical utilities and type definitions.
//!
//! This module provides the fundamental types used throughout the library
//! and conversions between the row-per-point (N×3) and legacy column-per-point
//! (3×N) layouts.

use nalgebra::{DMatrix, Matrix3, Matrix4, Point3, Vector3};

use crate::CloudError;

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;

/// Arithmetic mean of a set of points, or `None` for an empty slice.
pub fn centroid(points: &[Pt3]) -> Option<Pt3> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    Some(Pt3::from(sum / points.len() as Real))
}

/// Pack points into a 3×N matrix (one column per point).
pub fn points_to_columns(points: &[Pt3]) -> DMatrix<Real> {
    DMatrix::from_fn(3, points.len(), |r, c| points[c][r])
}

/// Unpack a 3×N matrix (one column per point) into points.
///
/// Fails with [`CloudError::Dimension`] when the matrix does not have exactly
/// three rows.
pub fn columns_to_points(m: &DMatrix<Real>) -> Result<Vec<Pt3>, CloudError> {
    if m.nrows() != 3 {
        return Err(CloudError::Dimension {
            expected: 3,
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    Ok(m
        .column_iter()
        .map(|c| Pt3::new(c[0], c[1], c[2]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_empty_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn centroid_is_mean() {
        let c = centroid(&[Pt3::new(0.0, 0.0, 0.0), Pt3::new(2.0, 4.0, -6.0)]).unwrap();
        assert!((c - Pt3::new(1.0, 2.0, -3.0)).norm() < 1e-12);
    }

    #[test]
    fn columns_layout_matches_points() {
        let pts = vec![Pt3::new(1.0, 2.0, 3.0), Pt3::new(4.0, 5.0, 6.0)];
        let m = points_to_columns(&pts);
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m[(2, 1)], 6.0);
        assert_eq!(columns_to_points(&m).unwrap(), pts);
    }

    #[test]
    fn columns_reject_wrong_row_count() {
        let m = DMatrix::<Real>::zeros(2, 5);
        let err = columns_to_points(&m).unwrap_err();
        assert!(matches!(err, CloudError::Dimension { rows: 2, .. }));
    }
}
