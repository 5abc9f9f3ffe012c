//! Closed-form solvers for cap point-cloud registration.
//!
//! - [`alignment`]: rigid (Kabsch/Procrustes) and affine best-fit transforms
//!   between corresponding clouds,
//! - [`frame`]: canonical anatomical frame normalization, simulator space
//!   conversion, optode min-max normalization,
//! - [`axes`]: anatomical direction estimates from fiducial pairs and yaw
//!   correction.
//!
//! All solvers are deterministic and allocate only their outputs.

pub mod alignment;
pub mod axes;
pub mod frame;

pub use alignment::*;
pub use axes::*;
pub use frame::*;
