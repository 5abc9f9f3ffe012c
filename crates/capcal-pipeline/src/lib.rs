//! Calibration pipeline for cap sensor layouts.
//!
//! Data flow:
//! `template cloud → canonical frame → per-frame optode estimates → MNI atlas`
//!
//! - [`sequence`]: applies externally predicted per-frame rotation/scale
//!   pairs to the template optodes,
//! - [`mni`]: projects calibrated clouds into atlas space through an external
//!   [`AtlasProjector`],
//! - [`run_calibration`]: runs the whole chain with a [`CalibrationConfig`].
//!
//! Model inference, video handling and file formats stay outside; this crate
//! only consumes numbers they produce.

use capcal_core::{CloudError, LabeledCloud};
use capcal_linear::{to_standard_frame, FrameReport};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod config;
pub mod mni;
pub mod sequence;

pub use config::CalibrationConfig;
pub use mni::*;
pub use sequence::*;

/// Errors returned by the calibration pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Cloud(#[from] CloudError),
    /// The external atlas projector failed.
    #[error("atlas projection failed: {0:#}")]
    Projection(anyhow::Error),
    /// The atlas projector returned the wrong number of points.
    #[error("atlas projector returned {got} points for {expected} targets")]
    ProjectionSize { expected: usize, got: usize },
    /// Predictions must carry 3 (angles) or 6 (angles + scales) values.
    #[error("prediction rows have {width} values, expected 3 or 6")]
    PredictionWidth { width: usize },
}

/// Result of [`run_calibration`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// How the template was brought into the canonical frame.
    pub frame: FrameReport,
    /// One estimated cloud per frame transform.
    pub frames: Vec<LabeledCloud>,
    /// Whether `frames` are in atlas space.
    pub projected: bool,
}

/// Canonicalize `template`, apply every frame transform and, if configured and
/// a projector is available, project each frame into atlas space.
///
/// `template` is not modified.
pub fn run_calibration(
    template: &LabeledCloud,
    transforms: &[FrameTransform],
    projector: Option<&dyn AtlasProjector>,
    config: &CalibrationConfig,
) -> Result<CalibrationReport, PipelineError> {
    let mut cloud = template.clone();
    let frame = to_standard_frame(&mut cloud, &config.frame)?;
    let mut frames = apply_transforms(&cloud, transforms, &config.sequence)?;
    info!("estimated {} frame(s)", frames.len());

    let projected = match (config.project_to_atlas, projector) {
        (true, Some(projector)) => {
            frames = project_to_atlas(&frames, projector, &config.atlas)?;
            true
        }
        (true, None) => {
            warn!("atlas projection requested but no projector supplied");
            false
        }
        (false, _) => false,
    };

    Ok(CalibrationReport {
        frame,
        frames,
        projected,
    })
}
