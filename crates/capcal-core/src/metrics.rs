//! Error metrics between corresponding point clouds.
//!
//! Two conventions coexist:
//! - [`rmse`] works on row-per-point clouds and returns the **mean Euclidean
//!   distance** between corresponding points,
//! - [`rmse_columns`] works on 3×N matrices and divides the summed squared
//!   error by the larger matrix dimension before taking the root. Outputs of
//!   older tooling were produced with this formula, so it is kept as is.

use nalgebra::DMatrix;

use crate::{CloudError, LabeledCloud, Pt3, Real};

/// Mean Euclidean distance between corresponding points of `a` and `b`.
pub fn rmse(a: &[Pt3], b: &[Pt3]) -> Result<Real, CloudError> {
    if a.len() != b.len() {
        return Err(CloudError::CountMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(CloudError::NotEnoughPoints { needed: 1, got: 0 });
    }
    let total: Real = a.iter().zip(b).map(|(p, q)| (p - q).norm()).sum();
    Ok(total / a.len() as Real)
}

/// `sqrt(sum((a - b)^2) / max(rows, cols))` over two equally shaped matrices.
///
/// For a 3×N input with N ≥ 3 this is the usual root-mean-square point
/// distance; for N < 3 the divisor is 3, not N.
pub fn rmse_columns(a: &DMatrix<Real>, b: &DMatrix<Real>) -> Result<Real, CloudError> {
    if a.nrows() != b.nrows() {
        return Err(CloudError::Dimension {
            expected: a.nrows(),
            rows: b.nrows(),
            cols: b.ncols(),
        });
    }
    if a.ncols() != b.ncols() {
        return Err(CloudError::CountMismatch {
            left: a.ncols(),
            right: b.ncols(),
        });
    }
    let count = a.nrows().max(a.ncols());
    if count == 0 {
        return Err(CloudError::NotEnoughPoints { needed: 1, got: 0 });
    }
    let sq = (a - b).norm_squared();
    Ok((sq / count as Real).sqrt())
}

/// [`rmse`] between the optode subsets of two clouds with identical labels.
pub fn optode_rmse(a: &LabeledCloud, b: &LabeledCloud) -> Result<Real, CloudError> {
    if a.len() != b.len() {
        return Err(CloudError::CountMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.labels() != b.labels() {
        return Err(CloudError::Degenerate(
            "clouds have different label sequences".into(),
        ));
    }
    rmse(a.optode_points()?, b.optode_points()?)
}
