//! Synthetic head and cap layouts.
//!
//! [`canonical_head`] places the usual facial/10-20 fiducials on a spherical
//! head already expressed in the canonical anatomical frame (x: left→right,
//! y: back→front, z: bottom→top, centimeters, origin at
//! `(eyes.x, cz.y, eyes.z)`), followed by optodes spread over the upper cap
//! on a golden-angle spiral. Layouts are fully deterministic; [`jitter`]
//! adds seeded uniform noise on top.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{fiducials, Label, LabeledCloud, Pt3, Real};

/// Parameters of a synthetic head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadSpec {
    /// Head radius in centimeters.
    pub radius: Real,
    /// Number of optodes on the cap.
    pub optodes: usize,
    /// Whether to emit an `inion` fiducial.
    pub include_inion: bool,
}

impl Default for HeadSpec {
    fn default() -> Self {
        Self {
            radius: 10.0,
            optodes: 100,
            include_inion: true,
        }
    }
}

/// Fiducial positions for a unit-radius head (scaled by [`HeadSpec::radius`]).
const UNIT_FIDUCIALS: [(&str, [Real; 3]); 9] = [
    (fiducials::NOSEBRIDGE, [0.0, 0.98, 0.05]),
    (fiducials::INION, [0.0, -0.95, 0.0]),
    (fiducials::RIGHT_EAR, [0.76, 0.05, -0.15]),
    (fiducials::LEFT_EAR, [-0.76, 0.05, -0.15]),
    (fiducials::RIGHT_EYE, [0.32, 0.9, 0.0]),
    (fiducials::LEFT_EYE, [-0.32, 0.9, 0.0]),
    (fiducials::FP1, [-0.28, 0.89, 0.42]),
    (fiducials::FP2, [0.28, 0.89, 0.42]),
    (fiducials::CZ, [0.0, 0.0, 1.0]),
];

/// Build a deterministic head in the canonical frame.
pub fn canonical_head(spec: &HeadSpec) -> LabeledCloud {
    let r = spec.radius;
    let mut labels = Vec::with_capacity(UNIT_FIDUCIALS.len() + spec.optodes);
    let mut points = Vec::with_capacity(UNIT_FIDUCIALS.len() + spec.optodes);

    for (name, p) in UNIT_FIDUCIALS {
        if name == fiducials::INION && !spec.include_inion {
            continue;
        }
        labels.push(Label::from(name));
        points.push(Pt3::new(p[0] * r, p[1] * r, p[2] * r));
    }

    let golden = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    let (cos_hi, cos_lo) = (10.0_f64.to_radians().cos(), 80.0_f64.to_radians().cos());
    for i in 0..spec.optodes {
        let t = (i as Real + 0.5) / spec.optodes as Real;
        let cos_theta = cos_hi - t * (cos_hi - cos_lo);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        let phi = i as Real * golden;
        labels.push(Label::Optode(i as u32));
        points.push(Pt3::new(
            r * sin_theta * phi.cos(),
            r * sin_theta * phi.sin(),
            r * cos_theta,
        ));
    }

    // Invariant holds by construction.
    LabeledCloud::from_pairs(labels.into_iter().zip(points))
}

/// Add seeded uniform noise in `[-max_abs, +max_abs]` to every coordinate.
pub fn jitter(cloud: &LabeledCloud, max_abs: Real, seed: u64) -> LabeledCloud {
    let max_abs = max_abs.abs();
    let mut out = cloud.clone();
    if max_abs == 0.0 {
        return out;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    for p in out.points_mut() {
        for k in 0..3 {
            p[k] += rng.random_range(-max_abs..=max_abs);
        }
    }
    out
}
