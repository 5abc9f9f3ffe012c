//! Projection of calibrated sensors into MNI atlas space.
//!
//! Anchors (fiducials shared with the atlas reference) stay fixed; every other
//! point is handed to an external [`AtlasProjector`], which expects anchors in
//! the order of [`CANONICAL_ANCHOR_NAMES`] together with their indices in that
//! list.

use capcal_core::{CloudError, Label, LabeledCloud, Pt3, Real};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Anchor order used by the atlas reference data.
pub const CANONICAL_ANCHOR_NAMES: [&str; 23] = [
    "nosebridge",
    "inion",
    "rightear",
    "leftear",
    "fp1",
    "fp2",
    "fz",
    "f3",
    "f4",
    "f7",
    "f8",
    "cz",
    "c3",
    "c4",
    "t3",
    "t4",
    "pz",
    "p3",
    "p4",
    "t5",
    "t6",
    "o1",
    "o2",
];

/// Output of an atlas projection, one entry per target point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtlasProjection {
    /// Projected positions on the scalp ("head") surface.
    pub scalp: Vec<Pt3>,
    /// Projected positions on the cortex surface.
    pub cortex: Vec<Pt3>,
    /// Per-target spread of the scalp estimate, if available.
    pub scalp_sd: Option<Vec<Real>>,
    /// Per-target spread of the cortex estimate, if available.
    pub cortex_sd: Option<Vec<Real>>,
}

/// Atlas reference that maps target points into MNI space from anchor
/// correspondences.
pub trait AtlasProjector {
    /// `anchors[i]` is the measured position of
    /// `CANONICAL_ANCHOR_NAMES[anchor_indices[i]]`; indices are ascending.
    fn project(
        &self,
        anchors: &[Pt3],
        anchor_indices: &[usize],
        targets: &[Pt3],
    ) -> anyhow::Result<AtlasProjection>;
}

impl<F> AtlasProjector for F
where
    F: Fn(&[Pt3], &[usize], &[Pt3]) -> anyhow::Result<AtlasProjection>,
{
    fn project(
        &self,
        anchors: &[Pt3],
        anchor_indices: &[usize],
        targets: &[Pt3],
    ) -> anyhow::Result<AtlasProjection> {
        self(anchors, anchor_indices, targets)
    }
}

/// Which projected surface replaces the target coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionSurface {
    #[default]
    Cortex,
    Scalp,
}

/// Options for [`project_to_atlas`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasOptions {
    /// Explicit anchor names. When `None`, every fiducial before the first
    /// optode is an anchor.
    pub anchor_names: Option<Vec<String>>,
    pub surface: ProjectionSurface,
}

/// Anchors reordered to the canonical list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorMatch {
    /// Index into [`CANONICAL_ANCHOR_NAMES`] for each anchor, ascending.
    pub canonical_indices: Vec<usize>,
    pub anchors: Vec<Pt3>,
}

/// Reorder named anchors to [`CANONICAL_ANCHOR_NAMES`].
///
/// Names missing from the canonical list are dropped, as are canonical names
/// without a measured anchor.
pub fn match_canonical_anchors(names: &[&str], points: &[Pt3]) -> AnchorMatch {
    let mut matched = AnchorMatch::default();
    for (ci, canonical) in CANONICAL_ANCHOR_NAMES.iter().enumerate() {
        for (name, p) in names.iter().zip(points) {
            if name == canonical {
                matched.canonical_indices.push(ci);
                matched.anchors.push(*p);
            }
        }
    }
    let dropped: Vec<&&str> = names
        .iter()
        .filter(|n| !CANONICAL_ANCHOR_NAMES.contains(*n))
        .collect();
    if !dropped.is_empty() {
        debug!("anchors without atlas counterpart: {:?}", dropped);
    }
    matched
}

struct Partition {
    anchor_names: Vec<String>,
    anchor_idx: Vec<usize>,
    target_idx: Vec<usize>,
}

fn partition(cloud: &LabeledCloud, names: Option<&[String]>) -> Result<Partition, CloudError> {
    match names {
        Some(names) => {
            let anchor_idx = names
                .iter()
                .map(|n| {
                    cloud
                        .position(n)
                        .ok_or_else(|| CloudError::MissingFiducial(n.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let target_idx = cloud
                .labels()
                .iter()
                .enumerate()
                .filter(|(_, l)| !matches!(l, Label::Fiducial(f) if names.contains(f)))
                .map(|(i, _)| i)
                .collect();
            Ok(Partition {
                anchor_names: names.to_vec(),
                anchor_idx,
                target_idx,
            })
        }
        None => {
            let start = cloud.optode_start().map_err(|e| match e {
                CloudError::NoOptodes => CloudError::UnresolvedAnchors,
                other => other,
            })?;
            Ok(Partition {
                anchor_names: cloud.labels()[..start]
                    .iter()
                    .map(|l| l.to_string())
                    .collect(),
                anchor_idx: (0..start).collect(),
                target_idx: (start..cloud.len()).collect(),
            })
        }
    }
}

/// Project the non-anchor points of one cloud into atlas space.
pub fn project_cloud<P>(
    cloud: &LabeledCloud,
    projector: &P,
    opts: &AtlasOptions,
) -> Result<LabeledCloud, PipelineError>
where
    P: AtlasProjector + ?Sized,
{
    let part = partition(cloud, opts.anchor_names.as_deref())?;
    let pts = cloud.points();

    let names: Vec<&str> = part.anchor_names.iter().map(String::as_str).collect();
    let anchor_pts: Vec<Pt3> = part.anchor_idx.iter().map(|&i| pts[i]).collect();
    let matched = match_canonical_anchors(&names, &anchor_pts);
    let targets: Vec<Pt3> = part.target_idx.iter().map(|&i| pts[i]).collect();

    let projection = projector
        .project(&matched.anchors, &matched.canonical_indices, &targets)
        .map_err(PipelineError::Projection)?;
    let surface = match opts.surface {
        ProjectionSurface::Cortex => projection.cortex,
        ProjectionSurface::Scalp => projection.scalp,
    };
    if surface.len() != targets.len() {
        return Err(PipelineError::ProjectionSize {
            expected: targets.len(),
            got: surface.len(),
        });
    }

    let mut out = cloud.clone();
    let out_pts = out.points_mut();
    for (&i, p) in part.target_idx.iter().zip(surface) {
        out_pts[i] = p;
    }
    Ok(out)
}

/// Project every cloud in `clouds`, keeping anchors fixed.
pub fn project_to_atlas<P>(
    clouds: &[LabeledCloud],
    projector: &P,
    opts: &AtlasOptions,
) -> Result<Vec<LabeledCloud>, PipelineError>
where
    P: AtlasProjector + ?Sized,
{
    clouds
        .iter()
        .enumerate()
        .map(|(i, cloud)| {
            info!("projecting {} / {} point clouds to MNI", i + 1, clouds.len());
            project_cloud(cloud, projector, opts)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcal_core::Vec3;
    use std::cell::RefCell;

    /// Lifts targets by 1 (cortex) or 2 (scalp) and records what it was given.
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(Vec<Pt3>, Vec<usize>, Vec<Pt3>)>>,
    }

    impl AtlasProjector for Recorder {
        fn project(
            &self,
            anchors: &[Pt3],
            anchor_indices: &[usize],
            targets: &[Pt3],
        ) -> anyhow::Result<AtlasProjection> {
            self.calls
                .borrow_mut()
                .push((anchors.to_vec(), anchor_indices.to_vec(), targets.to_vec()));
            Ok(AtlasProjection {
                cortex: targets.iter().map(|p| p + Vec3::z()).collect(),
                scalp: targets.iter().map(|p| p + 2.0 * Vec3::z()).collect(),
                ..Default::default()
            })
        }
    }

    fn cloud() -> LabeledCloud {
        LabeledCloud::from_pairs([
            (Label::from("cz"), Pt3::new(0.0, 0.0, 10.0)),
            (Label::from("lefteye"), Pt3::new(-3.0, 9.0, 0.0)),
            (Label::from("nosebridge"), Pt3::new(0.0, 9.8, 0.5)),
            (Label::from(0), Pt3::new(1.0, 1.0, 9.0)),
            (Label::from(1), Pt3::new(-1.0, 1.0, 9.0)),
        ])
    }

    #[test]
    fn anchors_follow_canonical_order() {
        let m = match_canonical_anchors(
            &["cz", "lefteye", "nosebridge"],
            &[Pt3::new(1.0, 0.0, 0.0), Pt3::new(2.0, 0.0, 0.0), Pt3::new(3.0, 0.0, 0.0)],
        );
        // lefteye is not an atlas anchor
        assert_eq!(m.canonical_indices, vec![0, 11]);
        assert_eq!(m.anchors, vec![Pt3::new(3.0, 0.0, 0.0), Pt3::new(1.0, 0.0, 0.0)]);
    }

    #[test]
    fn implicit_anchors_are_the_fiducial_prefix() {
        let rec = Recorder::default();
        let input = cloud();
        let out = project_cloud(&input, &rec, &AtlasOptions::default()).unwrap();

        assert_eq!(&out.points()[..3], &input.points()[..3]);
        assert_eq!(out.points()[3], Pt3::new(1.0, 1.0, 10.0));
        assert_eq!(out.points()[4], Pt3::new(-1.0, 1.0, 10.0));

        let calls = rec.calls.borrow();
        let (anchors, indices, targets) = &calls[0];
        assert_eq!(indices, &vec![0, 11]);
        assert_eq!(anchors[0], Pt3::new(0.0, 9.8, 0.5));
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn explicit_anchor_names_select_targets() {
        let rec = Recorder::default();
        let opts = AtlasOptions {
            anchor_names: Some(vec!["nosebridge".into(), "cz".into()]),
            surface: ProjectionSurface::Scalp,
        };
        let input = cloud();
        let out = project_cloud(&input, &rec, &opts).unwrap();

        // lefteye is now a target too
        assert_eq!(out.fiducial("lefteye").unwrap(), Pt3::new(-3.0, 9.0, 2.0));
        assert_eq!(out.fiducial("cz").unwrap(), Pt3::new(0.0, 0.0, 10.0));
        assert_eq!(out.points()[3], Pt3::new(1.0, 1.0, 11.0));
        assert_eq!(rec.calls.borrow()[0].2.len(), 3);
    }

    #[test]
    fn missing_explicit_anchor_is_reported() {
        let opts = AtlasOptions {
            anchor_names: Some(vec!["inion".into()]),
            ..Default::default()
        };
        let err = project_cloud(&cloud(), &Recorder::default(), &opts).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Cloud(CloudError::MissingFiducial(ref n)) if n == "inion"
        ));
    }

    #[test]
    fn no_optodes_and_no_names_is_unresolved() {
        let fiducials_only = LabeledCloud::from_pairs([("cz", Pt3::origin())]);
        let err =
            project_cloud(&fiducials_only, &Recorder::default(), &AtlasOptions::default())
                .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Cloud(CloudError::UnresolvedAnchors)
        ));
    }

    #[test]
    fn closures_are_projectors() {
        let shrink = |_: &[Pt3], _: &[usize], t: &[Pt3]| -> anyhow::Result<AtlasProjection> {
            Ok(AtlasProjection {
                cortex: t.iter().map(|p| Pt3::from(p.coords * 0.5)).collect(),
                ..Default::default()
            })
        };
        let out = project_to_atlas(&[cloud(), cloud()], &shrink, &AtlasOptions::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].points()[3], Pt3::new(0.5, 0.5, 4.5));
    }

    #[test]
    fn short_projection_is_rejected() {
        let empty = |_: &[Pt3], _: &[usize], _: &[Pt3]| -> anyhow::Result<AtlasProjection> {
            Ok(AtlasProjection::default())
        };
        let err = project_cloud(&cloud(), &empty, &AtlasOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ProjectionSize { expected: 2, got: 0 }
        ));
    }

    #[test]
    fn projector_failure_propagates() {
        let failing = |_: &[Pt3], _: &[usize], _: &[Pt3]| -> anyhow::Result<AtlasProjection> {
            anyhow::bail!("atlas data not loaded")
        };
        let err = project_cloud(&cloud(), &failing, &AtlasOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Projection(_)));
    }
}
