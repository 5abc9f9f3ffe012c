//! Best-fit transforms between corresponding point clouds.
//!
//! [`rigid_align`] solves `min Σ ‖R a_i + t − b_i‖²` over proper rotations
//! via the SVD of the cross-covariance; [`affine_align`] solves the
//! unconstrained homogeneous least-squares problem `[a 1] W ≈ [b 1]`.

use capcal_core::{centroid, columns_to_points, CloudError, Mat3, Mat4, Pt3, Real, Vec3};
use log::{debug, info};
use nalgebra::{DMatrix, Rotation3};
use serde::{Deserialize, Serialize};

/// Relative singular-value floor below which the cross-covariance is
/// considered rank deficient.
const RANK_TOL: Real = 1e-10;

/// Rotation followed by translation: `p' = R p + t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: Mat3,
    pub translation: Vec3,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self {
            rotation: Mat3::identity(),
            translation: Vec3::zeros(),
        }
    }
}

impl RigidTransform {
    pub fn apply(&self, p: &Pt3) -> Pt3 {
        Pt3::from(self.rotation * p.coords + self.translation)
    }

    pub fn apply_all(&self, points: &[Pt3]) -> Vec<Pt3> {
        points.iter().map(|p| self.apply(p)).collect()
    }

    /// Extrinsic x-y-z Euler angles of the rotation, in degrees.
    ///
    /// The rotation equals `Rz(z) · Ry(y) · Rx(x)`.
    pub fn euler_angles_deg(&self) -> Vec3 {
        let (roll, pitch, yaw) = Rotation3::from_matrix_unchecked(self.rotation).euler_angles();
        Vec3::new(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
    }
}

/// General affine map in row-vector form: `[p' 1] = [p 1] · W`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    /// 4×4 coefficient block `W`.
    pub matrix: Mat4,
}

impl AffineTransform {
    pub fn apply(&self, p: &Pt3) -> Pt3 {
        let row = p.to_homogeneous().transpose() * self.matrix;
        Pt3::new(row[0], row[1], row[2])
    }

    pub fn apply_all(&self, points: &[Pt3]) -> Vec<Pt3> {
        points.iter().map(|p| self.apply(p)).collect()
    }
}

fn check_counts(a: &[Pt3], b: &[Pt3], needed: usize) -> Result<(), CloudError> {
    if a.len() != b.len() {
        return Err(CloudError::CountMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.len() < needed {
        return Err(CloudError::NotEnoughPoints {
            needed,
            got: a.len(),
        });
    }
    Ok(())
}

/// Least-squares rigid transform mapping `a` onto `b` (Kabsch).
///
/// With centered clouds, `H = Σ a_i b_iᵀ = U S Vᵀ` and `R = V Uᵀ`. When that
/// product is a reflection (`det R < 0`) the right-singular vector of the
/// smallest singular value is negated and `R` recomputed, so the result is
/// always a proper rotation.
///
/// # Errors
/// - [`CloudError::CountMismatch`] / [`CloudError::NotEnoughPoints`] for
///   mismatched or fewer than three correspondences,
/// - [`CloudError::Degenerate`] when the points are coincident or collinear
///   (rotation not unique).
pub fn rigid_align(a: &[Pt3], b: &[Pt3]) -> Result<RigidTransform, CloudError> {
    check_counts(a, b, 3)?;
    let ca = centroid(a).ok_or(CloudError::NotEnoughPoints { needed: 3, got: 0 })?;
    let cb = centroid(b).ok_or(CloudError::NotEnoughPoints { needed: 3, got: 0 })?;

    let mut h = Mat3::zeros();
    for (pa, pb) in a.iter().zip(b) {
        h += (pa - ca) * (pb - cb).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(CloudError::SvdFailed)?;
    let mut v_t = svd.v_t.ok_or(CloudError::SvdFailed)?;
    let s = svd.singular_values;

    let mut sorted = [s[0], s[1], s[2]];
    sorted.sort_by(|x, y| y.total_cmp(x));
    if sorted[0] <= Real::EPSILON || sorted[1] <= RANK_TOL * sorted[0] {
        return Err(CloudError::Degenerate(format!(
            "cross-covariance has rank < 2 (singular values {:.3e}, {:.3e}, {:.3e})",
            sorted[0], sorted[1], sorted[2]
        )));
    }

    let mut r = v_t.transpose() * u.transpose();
    if r.determinant() < 0.0 {
        info!("det(R) < 0, reflection detected; correcting");
        let smallest = s.imin();
        v_t.row_mut(smallest).neg_mut();
        r = v_t.transpose() * u.transpose();
    }

    let t = cb.coords - r * ca.coords;
    debug!("rigid_align: {} points, |t| = {:.4}", a.len(), t.norm());
    Ok(RigidTransform {
        rotation: r,
        translation: t,
    })
}

/// [`rigid_align`] for clouds stored one point per column (3×N).
pub fn rigid_align_columns(
    a: &DMatrix<Real>,
    b: &DMatrix<Real>,
) -> Result<RigidTransform, CloudError> {
    rigid_align(&columns_to_points(a)?, &columns_to_points(b)?)
}

/// Unconstrained least-squares affine map from `a` to `b`.
///
/// Solves `[a|1] · W = [b|1]` for the 4×4 `W` using the SVD pseudo-inverse,
/// which yields the minimum-norm solution when the system is under-determined
/// (fewer than four points, or coplanar points).
pub fn affine_align(a: &[Pt3], b: &[Pt3]) -> Result<AffineTransform, CloudError> {
    check_counts(a, b, 1)?;
    let n = a.len();
    let lhs = DMatrix::from_fn(n, 4, |i, j| if j < 3 { a[i][j] } else { 1.0 });
    let rhs = DMatrix::from_fn(n, 4, |i, j| if j < 3 { b[i][j] } else { 1.0 });

    let svd = lhs.svd(true, true);
    let w = svd
        .solve(&rhs, RANK_TOL)
        .map_err(|_| CloudError::SvdFailed)?;

    Ok(AffineTransform {
        matrix: Mat4::from_iterator(w.iter().copied()),
    })
}

/// Euler angles (degrees) of the rigid alignment taking `model` onto `gt`.
///
/// Angles follow [`RigidTransform::euler_angles_deg`].
pub fn euler_angles(gt: &[Pt3], model: &[Pt3]) -> Result<Vec3, CloudError> {
    Ok(rigid_align(model, gt)?.euler_angles_deg())
}

/// Translate `a` so that its centroid coincides with the centroid of `b`.
pub fn align_centroids(a: &[Pt3], b: &[Pt3]) -> Result<Vec<Pt3>, CloudError> {
    let ca = centroid(a).ok_or(CloudError::NotEnoughPoints { needed: 1, got: 0 })?;
    let cb = centroid(b).ok_or(CloudError::NotEnoughPoints { needed: 1, got: 0 })?;
    let shift = cb - ca;
    Ok(a.iter().map(|p| p + shift).collect())
}
