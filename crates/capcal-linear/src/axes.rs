//! Anatomical direction estimates from fiducials.
//!
//! The rightward axis is the average of three horizontal fiducial-pair
//! directions (eyes, ears, fp1→fp2), which tolerates a misplaced sticker
//! better than any single pair. The frontward axis runs from the back of the
//! head to the nose bridge; how "the back of the head" is located is an
//! explicit [`FrontwardStrategy`].

use capcal_core::{fiducials, CloudError, LabeledCloud, Mat3, Pt3, Real, Vec3};
use log::debug;
use nalgebra::center;
use serde::{Deserialize, Serialize};

const MIN_NORM: Real = 1e-12;

/// How the back-of-head reference point for the frontward axis is found.
///
/// The two variants assume different template layouts; the choice changes the
/// frame definition, so it is reported alongside every frontward estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrontwardStrategy {
    /// Use the measured `inion` fiducial.
    FromInion,
    /// Use the midpoint of two optodes (indices relative to the first optode)
    /// that sit at the back of the template cap.
    FromTemplateProxy { first: usize, second: usize },
}

/// Options for axis estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisOptions {
    /// Optode indices standing in for the inion when it was not measured.
    pub inion_proxy: [usize; 2],
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self {
            inion_proxy: [83, 84],
        }
    }
}

impl FrontwardStrategy {
    /// `FromInion` when the cloud has an inion, the template proxy otherwise.
    pub fn select(cloud: &LabeledCloud, opts: &AxisOptions) -> Self {
        if cloud.contains(fiducials::INION) {
            FrontwardStrategy::FromInion
        } else {
            let [first, second] = opts.inion_proxy;
            debug!("no inion, using optodes {first}/{second} as back-of-head proxy");
            FrontwardStrategy::FromTemplateProxy { first, second }
        }
    }
}

/// A unit direction together with the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisEstimate {
    pub direction: Vec3,
    pub strategy: FrontwardStrategy,
}

fn unit(v: Vec3, what: &str) -> Result<Vec3, CloudError> {
    v.try_normalize(MIN_NORM)
        .ok_or_else(|| CloudError::Degenerate(format!("{what} has zero length")))
}

fn horizontal_direction(
    cloud: &LabeledCloud,
    from: &str,
    to: &str,
) -> Result<Vec3, CloudError> {
    let mut v = cloud.fiducial(to)? - cloud.fiducial(from)?;
    v.z = 0.0;
    unit(v, &format!("horizontal {from}->{to}"))
}

/// Averaged horizontal left→right direction.
///
/// Requires `lefteye`, `righteye`, `leftear`, `rightear`, `fp1`, `fp2`.
pub fn x_axis_vector(cloud: &LabeledCloud) -> Result<Vec3, CloudError> {
    let eyes = horizontal_direction(cloud, fiducials::LEFT_EYE, fiducials::RIGHT_EYE)?;
    let ears = horizontal_direction(cloud, fiducials::LEFT_EAR, fiducials::RIGHT_EAR)?;
    let forehead = horizontal_direction(cloud, fiducials::FP1, fiducials::FP2)?;
    unit((eyes + ears + forehead) / 3.0, "averaged rightward vector")
}

/// Rotate the cloud about the vertical so that x follows [`x_axis_vector`].
///
/// The rotation has rows `(u, z × u, z)` with `u` the rightward estimate and
/// `z = (0, 0, 1)`; pitch and roll are left alone.
pub fn fix_yaw(cloud: &LabeledCloud) -> Result<LabeledCloud, CloudError> {
    let u = x_axis_vector(cloud)?;
    let v = Vec3::z();
    let w = v.cross(&u);
    let rot = Mat3::from_rows(&[u.transpose(), w.transpose(), v.transpose()]);
    debug!("yaw correction {:.3} deg", u.y.atan2(u.x).to_degrees());
    rotate(cloud, &rot)
}

fn back_of_head(cloud: &LabeledCloud, strategy: FrontwardStrategy) -> Result<Pt3, CloudError> {
    match strategy {
        FrontwardStrategy::FromInion => cloud.fiducial(fiducials::INION),
        FrontwardStrategy::FromTemplateProxy { first, second } => {
            let optodes = cloud.optode_points()?;
            let needed = first.max(second) + 1;
            match (optodes.get(first), optodes.get(second)) {
                (Some(a), Some(b)) => Ok(center(a, b)),
                _ => Err(CloudError::NotEnoughPoints {
                    needed,
                    got: optodes.len(),
                }),
            }
        }
    }
}

/// Unit back→front direction ending at the nose bridge.
pub fn y_axis_vector(
    cloud: &LabeledCloud,
    strategy: FrontwardStrategy,
) -> Result<Vec3, CloudError> {
    let nose = cloud.fiducial(fiducials::NOSEBRIDGE)?;
    let back = back_of_head(cloud, strategy)?;
    unit(nose - back, "frontward vector")
}

/// [`y_axis_vector`] with the strategy chosen by [`FrontwardStrategy::select`].
pub fn frontward_vector(
    cloud: &LabeledCloud,
    opts: &AxisOptions,
) -> Result<AxisEstimate, CloudError> {
    let strategy = FrontwardStrategy::select(cloud, opts);
    Ok(AxisEstimate {
        direction: y_axis_vector(cloud, strategy)?,
        strategy,
    })
}

/// Rotate the cloud into the frame spanned by the fiducial axes.
///
/// Rows are `x` ([`x_axis_vector`]), `y` (the frontward vector made
/// orthogonal to `x`) and `x × y`.
pub fn align_to_anatomical_axes(
    cloud: &LabeledCloud,
    strategy: FrontwardStrategy,
) -> Result<LabeledCloud, CloudError> {
    let x = x_axis_vector(cloud)?;
    let y_raw = y_axis_vector(cloud, strategy)?;
    let y = unit(y_raw - x * x.dot(&y_raw), "frontward vector orthogonal to x")?;
    let z = x.cross(&y);
    let rot = Mat3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);
    rotate(cloud, &rot)
}

fn rotate(cloud: &LabeledCloud, rot: &Mat3) -> Result<LabeledCloud, CloudError> {
    let points = cloud
        .points()
        .iter()
        .map(|p| Pt3::from(rot * p.coords))
        .collect();
    cloud.with_points(points)
}
