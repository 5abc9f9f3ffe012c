//! Canonical anatomical frame.
//!
//! The canonical ("standard") frame has
//! - x from the left ear towards the right ear,
//! - y from the back of the head towards the front,
//! - z from the bottom of the head towards the top,
//!
//! with the origin at `(eyes.x, cz.y, eyes.z)` (eye midpoint for x/z) and
//! coordinates in centimeters. [`to_standard_frame`] reaches it from an
//! arbitrary scanner frame using only axis swaps, reflections, a translation
//! and possibly a uniform inch→cm rescale; it never rotates.
//!
//! The simulator uses a left-handed frame that differs from the canonical one
//! by the sign of x, see [`from_standard_to_sim_space`].

use capcal_core::{fiducials, CloudError, LabeledCloud, Pt3, Real, Vec3};
use log::{debug, info};
use nalgebra::center;
use serde::{Deserialize, Serialize};

/// Options for [`to_standard_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameOptions {
    /// Rescale clouds that look like they were measured in inches.
    pub unit_correction: bool,
    /// A translated `cz.z` below this value is taken as inches. The
    /// head-center-to-vertex distance of an adult is ~9-10 cm.
    pub inch_threshold: Real,
    /// Factor applied when the inch heuristic fires.
    pub inch_to_cm: Real,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            unit_correction: true,
            inch_threshold: 7.0,
            inch_to_cm: 2.54,
        }
    }
}

/// What [`to_standard_frame`] did to the cloud.
///
/// A point `p` of the input maps to
/// `scale * (signs ⊙ [p[permutation[0]], p[permutation[1]], p[permutation[2]]] - origin)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Source axis that ended up at each canonical axis.
    pub permutation: [usize; 3],
    /// Reflection applied to each canonical axis (±1).
    pub signs: [Real; 3],
    /// Origin subtracted after the swaps and reflections.
    pub origin: Vec3,
    /// Uniform scale applied last (1 or the inch→cm factor).
    pub scale: Real,
}

impl FrameReport {
    /// True if any axis was mirrored.
    pub fn reflected(&self) -> bool {
        self.signs.iter().any(|&s| s < 0.0)
    }
}

fn swap_axes(points: &mut [Pt3], i: usize, j: usize) {
    if i == j {
        return;
    }
    for p in points.iter_mut() {
        p.coords.swap_rows(i, j);
    }
}

fn direction_sign(v: Real) -> Real {
    if v > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Bring `cloud` into the canonical anatomical frame, in place.
///
/// Steps:
/// 1. the axis of largest `|righteye - lefteye|` is swapped into x,
/// 2. of the remaining axes, the one of largest
///    `|mid(eyes) - mid(fp1, fp2)|` is swapped into z (the lower axis on a
///    tie),
/// 3. each axis is mirrored so that `righteye.x > lefteye.x`,
///    `lefteye.y > cz.y` and `cz.z > lefteye.z`,
/// 4. the origin moves to `(mid(eyes).x, cz.y, mid(eyes).z)`,
/// 5. if enabled and `cz.z < inch_threshold`, everything is scaled by
///    `inch_to_cm`.
///
/// Requires `lefteye`, `righteye`, `cz`, `fp1` and `fp2`, each exactly once.
/// On error the cloud is left untouched.
pub fn to_standard_frame(
    cloud: &mut LabeledCloud,
    opts: &FrameOptions,
) -> Result<FrameReport, CloudError> {
    let le = cloud.fiducial_index(fiducials::LEFT_EYE)?;
    let re = cloud.fiducial_index(fiducials::RIGHT_EYE)?;
    let cz = cloud.fiducial_index(fiducials::CZ)?;
    let fp1 = cloud.fiducial_index(fiducials::FP1)?;
    let fp2 = cloud.fiducial_index(fiducials::FP2)?;
    let pts = cloud.points_mut();

    let mut permutation = [0, 1, 2];

    let x_axis = (pts[re] - pts[le]).abs().imax();
    swap_axes(pts, 0, x_axis);
    permutation.swap(0, x_axis);

    let d = (center(&pts[le], &pts[re]) - center(&pts[fp1], &pts[fp2])).abs();
    let z_axis = if d[1] >= d[2] { 1 } else { 2 };
    swap_axes(pts, 2, z_axis);
    permutation.swap(2, z_axis);
    debug!("axis permutation {:?}", permutation);

    let signs = [
        direction_sign(pts[re].x - pts[le].x),
        direction_sign(pts[le].y - pts[cz].y),
        direction_sign(pts[cz].z - pts[le].z),
    ];
    let flip = Vec3::from(signs);
    if signs.iter().any(|&s| s < 0.0) {
        info!("reflection detected, mirroring axes {:?}", signs);
    }
    for p in pts.iter_mut() {
        p.coords.component_mul_assign(&flip);
    }

    let eyes = center(&pts[le], &pts[re]);
    let origin = Vec3::new(eyes.x, pts[cz].y, eyes.z);
    for p in pts.iter_mut() {
        *p -= origin;
    }

    let mut scale = 1.0;
    if opts.unit_correction && pts[cz].z < opts.inch_threshold {
        info!(
            "cz height {:.3} below {:.1}, assuming inches and scaling by {}",
            pts[cz].z, opts.inch_threshold, opts.inch_to_cm
        );
        scale = opts.inch_to_cm;
        for p in pts.iter_mut() {
            p.coords *= scale;
        }
    }

    Ok(FrameReport {
        permutation,
        signs,
        origin,
        scale,
    })
}

/// Convert canonical coordinates to the simulator's left-handed frame
/// (negates x), in place.
pub fn from_standard_to_sim_space(points: &mut [Pt3]) {
    for p in points.iter_mut() {
        p.x = -p.x;
    }
}

/// Convert simulator coordinates back to the canonical frame, in place.
///
/// The conversion negates a single axis, so it is its own inverse.
pub fn from_sim_to_standard_space(points: &mut [Pt3]) {
    from_standard_to_sim_space(points);
}

/// Min-max normalize the whole cloud by the optode bounding box.
///
/// Every point (fiducials included) is mapped through
/// `(p - min) / (max - min)`, where `min`/`max` are taken over optodes only,
/// so optodes land in `[0, 1]³` and fiducials may fall outside.
///
/// Fails with [`CloudError::Degenerate`] if an axis of the optode box has
/// zero extent.
pub fn normalize_coordinates(cloud: &LabeledCloud) -> Result<LabeledCloud, CloudError> {
    let optodes = cloud.optode_points()?;
    let mut lo = optodes[0].coords;
    let mut hi = optodes[0].coords;
    for p in &optodes[1..] {
        lo = lo.inf(&p.coords);
        hi = hi.sup(&p.coords);
    }
    let range = hi - lo;
    if let Some(axis) = range.iter().position(|&r| r <= 0.0 || !r.is_finite()) {
        return Err(CloudError::Degenerate(format!(
            "optode extent along axis {axis} is {}",
            range[axis]
        )));
    }

    let points = cloud
        .points()
        .iter()
        .map(|p| Pt3::from((p.coords - lo).component_div(&range)))
        .collect();
    cloud.with_points(points)
}
