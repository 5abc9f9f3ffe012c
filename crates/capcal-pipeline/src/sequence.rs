//! Per-frame optode trajectories.
//!
//! The inference side predicts, for every processed video frame, how the cap
//! is rotated and scaled relative to the template. [`apply_transforms`] turns
//! that sequence into one estimated cloud per frame: the fiducial prefix is
//! copied through and only the optode suffix moves.

use capcal_core::{CloudError, LabeledCloud, Mat3, Pt3, Real, Vec3};
use nalgebra::{DMatrix, Rotation3};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Rotation and (diagonal) scale for one frame; applied as `R · (S · p)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameTransform {
    pub rotation: Mat3,
    pub scale: Mat3,
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            rotation: Mat3::identity(),
            scale: Mat3::identity(),
        }
    }
}

impl FrameTransform {
    /// Build a transform from simulator Euler angles in degrees.
    ///
    /// The simulator uses a left-handed rule, so the y and z angles are
    /// negated before composing the usual extrinsic x-y-z rotation
    /// `Rz(-z) · Ry(-y) · Rx(x)`. The positive x direction is flipped in the
    /// simulator instead, so x keeps its sign.
    pub fn from_sim_euler_degrees(angles: [Real; 3], scale: Option<[Real; 3]>) -> Self {
        let rotation = Rotation3::from_euler_angles(
            angles[0].to_radians(),
            -angles[1].to_radians(),
            -angles[2].to_radians(),
        );
        let scale = scale
            .map(|s| Mat3::from_diagonal(&Vec3::from(s)))
            .unwrap_or_else(Mat3::identity);
        Self {
            rotation: rotation.into_inner(),
            scale,
        }
    }

    /// Combined linear map `R · S`.
    pub fn matrix(&self) -> Mat3 {
        self.rotation * self.scale
    }

    pub fn apply(&self, p: &Pt3) -> Pt3 {
        Pt3::from(self.rotation * (self.scale * p.coords))
    }
}

/// Convert a `frames × 3` (angles) or `frames × 6` (angles + scales) batch of
/// predictions into per-frame transforms.
pub fn frame_transforms_from_predictions(
    predictions: &DMatrix<Real>,
) -> Result<Vec<FrameTransform>, PipelineError> {
    let width = predictions.ncols();
    if width != 3 && width != 6 {
        return Err(PipelineError::PredictionWidth { width });
    }
    Ok(predictions
        .row_iter()
        .map(|row| {
            let scale = (width == 6).then(|| [row[3], row[4], row[5]]);
            FrameTransform::from_sim_euler_degrees([row[0], row[1], row[2]], scale)
        })
        .collect())
}

/// How successive frame transforms relate to the template optodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameComposition {
    /// Each frame transforms the template optodes.
    #[default]
    Independent,
    /// Each frame transforms the previous frame's result.
    Cumulative,
}

/// Options for [`apply_transforms`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceOptions {
    pub composition: FrameComposition,
}

/// One estimated cloud per transform, in input order.
///
/// `cloud` is expected in the canonical frame. With the default
/// [`FrameComposition::Independent`] every frame starts from the template;
/// output of the older chained loop needs [`FrameComposition::Cumulative`].
///
/// Fails with [`CloudError::NoOptodes`] if nothing in the cloud is
/// calibratable; an empty `transforms` slice yields an empty result.
pub fn apply_transforms(
    cloud: &LabeledCloud,
    transforms: &[FrameTransform],
    opts: &SequenceOptions,
) -> Result<Vec<LabeledCloud>, CloudError> {
    let (fixed, template) = cloud.split_at_optodes()?;
    let mut previous = template.to_vec();
    let mut frames = Vec::with_capacity(transforms.len());

    for t in transforms {
        let source = match opts.composition {
            FrameComposition::Independent => template,
            FrameComposition::Cumulative => previous.as_slice(),
        };
        let moved: Vec<Pt3> = source.iter().map(|p| t.apply(p)).collect();

        let mut points = Vec::with_capacity(cloud.len());
        points.extend_from_slice(fixed);
        points.extend_from_slice(&moved);
        frames.push(cloud.with_points(points)?);
        previous = moved;
    }
    Ok(frames)
}
