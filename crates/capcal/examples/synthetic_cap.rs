//! End-to-end calibration of a synthetic cap.
//!
//! A synthetic head is "captured" by a scanner with shuffled axes, a mirrored
//! axis and inch units. The capture is brought back to the canonical frame,
//! moved through a short sequence of predicted head poses, and projected with
//! a toy atlas that pulls every optode towards the head center.
//!
//! Run with: `cargo run -p capcal --example synthetic_cap`

use anyhow::Result;
use capcal::core::synthetic::{canonical_head, jitter, HeadSpec};
use capcal::core::nalgebra::DMatrix;
use capcal::pipeline::frame_transforms_from_predictions;
use capcal::prelude::*;

fn toy_atlas(
    _anchors: &[Pt3],
    anchor_indices: &[usize],
    targets: &[Pt3],
) -> anyhow::Result<AtlasProjection> {
    anyhow::ensure!(anchor_indices.len() >= 4, "too few anchors");
    Ok(AtlasProjection {
        scalp: targets.to_vec(),
        cortex: targets.iter().map(|p| Pt3::from(p.coords * 0.8)).collect(),
        ..Default::default()
    })
}

fn main() -> Result<()> {
    let head = canonical_head(&HeadSpec::default());
    let noisy = jitter(&head, 0.05, 7);

    // scanner frame: (x, y, z) -> (y, z, -x), inches, arbitrary offset
    let scanned: Vec<Pt3> = noisy
        .points()
        .iter()
        .map(|p| Pt3::new(p.y, p.z, -p.x) / 2.54 + Vec3::new(4.0, -2.0, 11.0))
        .collect();
    let capture = noisy.with_points(scanned)?;

    // sim-space Euler angles (degrees) followed by per-axis scale
    let predictions = DMatrix::from_row_slice(
        3,
        6,
        &[
            0.0, 0.0, 0.0, 1.0, 1.0, 1.0, //
            5.0, -10.0, 0.0, 1.0, 1.0, 1.0, //
            0.0, 20.0, 8.0, 1.02, 0.98, 1.0,
        ],
    );
    let transforms = frame_transforms_from_predictions(&predictions)?;

    let config = CalibrationConfig::default();
    let projector: &dyn AtlasProjector = &toy_atlas;
    let report = run_calibration(&capture, &transforms, Some(projector), &config)?;

    println!(
        "axes {:?}, signs {:?}, scale {:.2}",
        report.frame.permutation, report.frame.signs, report.frame.scale
    );

    let mut recovered = capture.clone();
    to_standard_frame(&mut recovered, &config.frame)?;
    println!(
        "template recovery error: {:.4} cm",
        rmse(recovered.points(), noisy.points())?
    );

    for (i, frame) in report.frames.iter().enumerate() {
        let opt = frame.optode_points()?;
        println!("frame {i}: {} optodes, first at {:?}", opt.len(), opt[0]);
    }
    println!("{}", serde_json::to_string_pretty(&report.frame)?);

    Ok(())
}
