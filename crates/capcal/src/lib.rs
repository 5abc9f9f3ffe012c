//! High-level entry crate for `capcal-rs`.
//!
//! `capcal` calibrates the sensor layout of a wearable EEG/fNIRS cap: a
//! measured template cloud is brought into a canonical head frame, moved
//! frame by frame with externally predicted rotations and scales, and finally
//! projected into MNI atlas space.
//!
//! ```no_run
//! use capcal::core::synthetic::{canonical_head, HeadSpec};
//! use capcal::pipeline::{
//!     frame_transforms_from_predictions, run_calibration, CalibrationConfig,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // measured template: fiducials first, then optodes
//! let template = canonical_head(&HeadSpec::default());
//! // one row of sim-space Euler angles (degrees) per video frame
//! let predictions = capcal::core::nalgebra::DMatrix::<f64>::zeros(1, 3);
//!
//! let transforms = frame_transforms_from_predictions(&predictions)?;
//! let report = run_calibration(&template, &transforms, None, &CalibrationConfig::default())?;
//! println!("{} frame(s), reflected: {}", report.frames.len(), report.frame.reflected());
//! # Ok(())
//! # }
//! ```
//!
//! The building blocks are usable on their own:
//!
//! ```
//! use capcal::core::Pt3;
//! use capcal::linear::rigid_align;
//!
//! let a = [
//!     Pt3::new(0.0, 0.0, 0.0),
//!     Pt3::new(1.0, 0.0, 0.0),
//!     Pt3::new(0.0, 1.0, 0.0),
//!     Pt3::new(0.0, 0.0, 1.0),
//! ];
//! let rt = rigid_align(&a, &a).unwrap();
//! assert!((rt.rotation.determinant() - 1.0).abs() < 1e-12);
//! ```
//!
//! ## Module Organization
//!
//! - **[`core`]**: point/matrix aliases, labeled clouds, error metrics, synthetic heads
//! - **[`linear`]**: rigid/affine alignment, canonical frame, anatomical axes
//! - **[`pipeline`]**: per-frame sequencing, atlas projection, end-to-end runs
//! - **[`prelude`]**: convenient re-exports for common use cases

/// Point/matrix aliases, labeled clouds, error metrics and synthetic heads.
pub mod core {
    pub use capcal_core::*;
}

/// Closed-form alignment and anatomical frame normalization.
pub mod linear {
    pub use capcal_linear::*;
}

/// Per-frame sequencing, atlas projection and end-to-end calibration runs.
pub mod pipeline {
    pub use capcal_pipeline::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use capcal::prelude::*;` to get started quickly.
pub mod prelude {
    pub use capcal_core::{rmse, CloudError, Label, LabeledCloud, Mat3, Pt3, Real, Vec3};
    pub use capcal_linear::{
        affine_align, fix_yaw, rigid_align, to_standard_frame, FrameOptions, RigidTransform,
    };
    pub use capcal_pipeline::{
        apply_transforms, project_to_atlas, run_calibration, AtlasProjection, AtlasProjector,
        CalibrationConfig, FrameTransform, PipelineError,
    };
}
