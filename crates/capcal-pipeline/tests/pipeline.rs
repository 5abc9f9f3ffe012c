use std::fs;

use capcal_core::synthetic::{canonical_head, HeadSpec};
use capcal_core::{rmse, CloudError, LabeledCloud, Pt3, Real, Vec3};
use capcal_pipeline::{
    frame_transforms_from_predictions, run_calibration, AtlasProjection, AtlasProjector,
    CalibrationConfig, FrameTransform, PipelineError, ProjectionSurface,
};
use nalgebra::DMatrix;
use tempfile::NamedTempFile;

/// Scanner capture of the canonical head: axes shuffled, y mirrored, inches.
fn scanned_head() -> (LabeledCloud, LabeledCloud) {
    let head = canonical_head(&HeadSpec::default());
    let scanned = head
        .points()
        .iter()
        .map(|p| Pt3::new(p.y, p.z, -p.x) / 2.54 + Vec3::new(-1.0, 30.0, 2.0))
        .collect();
    let capture = head.with_points(scanned).unwrap();
    (head, capture)
}

/// Pulls every target 15% towards the head center.
fn shrink_projector(
    _anchors: &[Pt3],
    indices: &[usize],
    targets: &[Pt3],
) -> anyhow::Result<AtlasProjection> {
    anyhow::ensure!(!indices.is_empty(), "no anchors matched");
    Ok(AtlasProjection {
        cortex: targets.iter().map(|p| Pt3::from(p.coords * 0.85)).collect(),
        scalp: targets.to_vec(),
        ..Default::default()
    })
}

fn predictions() -> DMatrix<Real> {
    DMatrix::from_row_slice(3, 3, &[
        0.0, 0.0, 0.0, //
        5.0, -3.0, 12.0, //
        -8.0, 2.0, -20.0,
    ])
}

#[test]
fn scanner_capture_to_frames() {
    let (head, capture) = scanned_head();
    let transforms = frame_transforms_from_predictions(&predictions()).unwrap();
    let config = CalibrationConfig {
        project_to_atlas: false,
        ..Default::default()
    };

    let report = run_calibration(&capture, &transforms, None, &config).unwrap();
    assert!(!report.projected);
    assert_eq!(report.frame.scale, 2.54);
    assert_eq!(report.frames.len(), 3);

    let start = head.optode_start().unwrap();
    for (frame, t) in report.frames.iter().zip(&transforms) {
        assert_eq!(frame.labels(), head.labels());
        let fid_err = rmse(&frame.points()[..start], &head.points()[..start]).unwrap();
        assert!(fid_err < 1e-9, "fiducials moved: {fid_err}");

        let expected: Vec<Pt3> = head.optode_points().unwrap().iter().map(|p| t.apply(p)).collect();
        let opt_err = rmse(frame.optode_points().unwrap(), &expected).unwrap();
        assert!(opt_err < 1e-9, "optode rmse {opt_err}");
    }

    // first prediction is the identity
    let err = rmse(report.frames[0].points(), head.points()).unwrap();
    assert!(err < 1e-9);
}

#[test]
fn projection_replaces_optodes_only() {
    let (head, capture) = scanned_head();
    let transforms = vec![FrameTransform::default()];
    let projector: &dyn AtlasProjector = &shrink_projector;

    let report =
        run_calibration(&capture, &transforms, Some(projector), &CalibrationConfig::default())
            .unwrap();
    assert!(report.projected);

    let frame = &report.frames[0];
    let start = head.optode_start().unwrap();
    assert!(rmse(&frame.points()[..start], &head.points()[..start]).unwrap() < 1e-9);
    for (p, q) in frame.optode_points().unwrap().iter().zip(head.optode_points().unwrap()) {
        assert!((p.coords - q.coords * 0.85).norm() < 1e-9);
    }
}

#[test]
fn missing_projector_is_not_fatal() {
    let (_, capture) = scanned_head();
    let report = run_calibration(
        &capture,
        &[FrameTransform::default()],
        None,
        &CalibrationConfig::default(),
    )
    .unwrap();
    assert!(!report.projected);
}

#[test]
fn config_file_drives_the_run() {
    let (head, capture) = scanned_head();
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        r#"{"atlas": {"surface": "scalp", "anchor_names": ["nosebridge", "inion", "cz"]}}"#,
    )
    .unwrap();
    let config = CalibrationConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.atlas.surface, ProjectionSurface::Scalp);

    let projector: &dyn AtlasProjector = &shrink_projector;
    let report = run_calibration(
        &capture,
        &[FrameTransform::default()],
        Some(projector),
        &config,
    )
    .unwrap();
    // scalp surface of this projector is the identity
    assert!(rmse(report.frames[0].points(), head.points()).unwrap() < 1e-9);
}

#[test]
fn template_without_optodes_fails() {
    let head = canonical_head(&HeadSpec {
        optodes: 0,
        ..Default::default()
    });
    let err = run_calibration(
        &head,
        &[FrameTransform::default()],
        None,
        &CalibrationConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Cloud(CloudError::NoOptodes)));
}

#[test]
fn template_without_cz_fails_before_any_work() {
    let head = canonical_head(&HeadSpec::default());
    let kept: Vec<_> = head
        .iter()
        .filter(|(l, _)| l.as_fiducial() != Some("cz"))
        .map(|(l, p)| (l.clone(), *p))
        .collect();
    let err = run_calibration(
        &LabeledCloud::from_pairs(kept),
        &[],
        None,
        &CalibrationConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Cloud(CloudError::MissingFiducial(ref n)) if n == "cz"
    ));
}

#[test]
fn report_serializes_to_json() {
    let (_, capture) = scanned_head();
    let report = run_calibration(
        &capture,
        &[FrameTransform::default()],
        None,
        &CalibrationConfig::default(),
    )
    .unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"permutation\""));
    assert!(json.contains("\"nosebridge\""));
}
