//! Core types and metrics for `capcal-rs`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt3`, ...),
//! - the labeled point cloud ([`LabeledCloud`]) shared by every stage,
//!   together with the fiducial/optode label convention,
//! - error metrics between point clouds ([`rmse`], [`rmse_columns`], [`optode_rmse`]),
//! - a deterministic synthetic head/cap generator used by tests and demos.
//!
//! Label convention:
//! `[fiducial, fiducial, ..., optode 0, optode 1, ...]`
//!
//! Named fiducials (`lefteye`, `cz`, ...) anchor registration; integer-labeled
//! optodes are the sensors whose positions are being calibrated.

/// Labeled point clouds and fiducial lookup.
pub mod cloud;
mod error;
/// Linear algebra type aliases and helpers.
pub mod math;
/// RMSE between point clouds.
pub mod metrics;
/// Deterministic synthetic heads for tests and demos.
pub mod synthetic;

pub use cloud::*;
pub use error::CloudError;
pub use math::*;
pub use metrics::*;

/// The linear algebra crate behind every point and matrix type.
pub use nalgebra;
