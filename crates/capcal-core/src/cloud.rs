//! Labeled point clouds.
//!
//! A [`LabeledCloud`] pairs an ordered label sequence with one 3D point per
//! label. Labels are either named fiducials (`"lefteye"`, `"cz"`, ...) or
//! integer optode indices. By convention every optode follows every fiducial,
//! so the cloud splits into a fixed fiducial prefix and a calibratable optode
//! suffix at [`LabeledCloud::optode_start`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CloudError, Pt3};

/// Well-known fiducial names.
pub mod fiducials {
    pub const LEFT_EYE: &str = "lefteye";
    pub const RIGHT_EYE: &str = "righteye";
    pub const LEFT_EAR: &str = "leftear";
    pub const RIGHT_EAR: &str = "rightear";
    pub const NOSEBRIDGE: &str = "nosebridge";
    pub const INION: &str = "inion";
    pub const CZ: &str = "cz";
    pub const FP1: &str = "fp1";
    pub const FP2: &str = "fp2";
}

/// Label of a single point: a named fiducial or a numbered optode.
///
/// Serializes untagged, so JSON label arrays read like `["cz", "fp1", 0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// Numbered sensor whose position is being calibrated.
    Optode(u32),
    /// Named anatomical landmark.
    Fiducial(String),
}

impl Label {
    pub fn is_optode(&self) -> bool {
        matches!(self, Label::Optode(_))
    }

    /// Fiducial name, or `None` for optodes.
    pub fn as_fiducial(&self) -> Option<&str> {
        match self {
            Label::Fiducial(name) => Some(name.as_str()),
            Label::Optode(_) => None,
        }
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Label::Fiducial(name.to_owned())
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Label::Fiducial(name)
    }
}

impl From<u32> for Label {
    fn from(index: u32) -> Self {
        Label::Optode(index)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Optode(i) => write!(f, "{i}"),
            Label::Fiducial(name) => f.write_str(name),
        }
    }
}

/// Ordered labels paired positionally with 3D points.
///
/// Invariant: `labels().len() == points().len()`. The label sequence is
/// immutable once built; coordinates can be edited through
/// [`LabeledCloud::points_mut`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CloudParts")]
pub struct LabeledCloud {
    labels: Vec<Label>,
    points: Vec<Pt3>,
}

#[derive(Deserialize)]
struct CloudParts {
    labels: Vec<Label>,
    points: Vec<Pt3>,
}

impl TryFrom<CloudParts> for LabeledCloud {
    type Error = CloudError;

    fn try_from(parts: CloudParts) -> Result<Self, Self::Error> {
        LabeledCloud::new(parts.labels, parts.points)
    }
}

impl LabeledCloud {
    /// Build a cloud, checking that labels and points have the same length.
    pub fn new(labels: Vec<Label>, points: Vec<Pt3>) -> Result<Self, CloudError> {
        if labels.len() != points.len() {
            return Err(CloudError::CountMismatch {
                left: labels.len(),
                right: points.len(),
            });
        }
        Ok(Self { labels, points })
    }

    /// Build a cloud from `(label, point)` pairs.
    pub fn from_pairs<L, I>(pairs: I) -> Self
    where
        L: Into<Label>,
        I: IntoIterator<Item = (L, Pt3)>,
    {
        let (labels, points) = pairs.into_iter().map(|(l, p)| (l.into(), p)).unzip();
        Self { labels, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn points(&self) -> &[Pt3] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [Pt3] {
        &mut self.points
    }

    pub fn into_parts(self) -> (Vec<Label>, Vec<Pt3>) {
        (self.labels, self.points)
    }

    /// Same labels, new coordinates.
    pub fn with_points(&self, points: Vec<Pt3>) -> Result<Self, CloudError> {
        Self::new(self.labels.clone(), points)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &Pt3)> {
        self.labels.iter().zip(self.points.iter())
    }

    /// Index of the first fiducial called `name`, if any.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.labels
            .iter()
            .position(|l| l.as_fiducial() == Some(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Index of a fiducial that must occur exactly once.
    pub fn fiducial_index(&self, name: &str) -> Result<usize, CloudError> {
        let mut found = self
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.as_fiducial() == Some(name))
            .map(|(i, _)| i);
        let first = found
            .next()
            .ok_or_else(|| CloudError::MissingFiducial(name.to_owned()))?;
        let extra = found.count();
        if extra > 0 {
            return Err(CloudError::DuplicateFiducial {
                name: name.to_owned(),
                count: extra + 1,
            });
        }
        Ok(first)
    }

    /// Coordinates of a fiducial that must occur exactly once.
    pub fn fiducial(&self, name: &str) -> Result<Pt3, CloudError> {
        self.fiducial_index(name).map(|i| self.points[i])
    }

    /// Index of the first optode.
    ///
    /// Fails with [`CloudError::NoOptodes`] when no label is an integer, and
    /// with [`CloudError::InterleavedLabels`] when a fiducial follows it.
    pub fn optode_start(&self) -> Result<usize, CloudError> {
        let start = self
            .labels
            .iter()
            .position(Label::is_optode)
            .ok_or(CloudError::NoOptodes)?;
        if let Some(offset) = self.labels[start..].iter().position(|l| !l.is_optode()) {
            return Err(CloudError::InterleavedLabels {
                index: start + offset,
            });
        }
        Ok(start)
    }

    /// `(fiducials, optodes)` split at the first optode.
    pub fn split_at_optodes(&self) -> Result<(&[Pt3], &[Pt3]), CloudError> {
        let start = self.optode_start()?;
        Ok(self.points.split_at(start))
    }

    /// Optode coordinates (the suffix after the fiducials).
    pub fn optode_points(&self) -> Result<&[Pt3], CloudError> {
        self.split_at_optodes().map(|(_, optodes)| optodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LabeledCloud {
        LabeledCloud::from_pairs([
            (Label::from("cz"), Pt3::new(0.0, 0.0, 9.0)),
            (Label::from("fp1"), Pt3::new(-2.0, 8.0, 3.0)),
            (Label::from(0), Pt3::new(1.0, 1.0, 1.0)),
            (Label::from(1), Pt3::new(2.0, 2.0, 2.0)),
        ])
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let err = LabeledCloud::new(vec![Label::from("cz")], vec![]).unwrap_err();
        assert_eq!(err, CloudError::CountMismatch { left: 1, right: 0 });
    }

    #[test]
    fn fiducial_lookup() {
        let cloud = sample();
        assert_eq!(cloud.fiducial_index("fp1").unwrap(), 1);
        assert_eq!(cloud.fiducial("cz").unwrap(), Pt3::new(0.0, 0.0, 9.0));
        assert_eq!(
            cloud.fiducial("inion").unwrap_err(),
            CloudError::MissingFiducial("inion".into())
        );
    }

    #[test]
    fn duplicate_fiducial_is_rejected() {
        let cloud = LabeledCloud::from_pairs([
            ("cz", Pt3::origin()),
            ("cz", Pt3::new(1.0, 0.0, 0.0)),
        ]);
        assert!(matches!(
            cloud.fiducial_index("cz"),
            Err(CloudError::DuplicateFiducial { count: 2, .. })
        ));
        assert_eq!(cloud.position("cz"), Some(0));
    }

    #[test]
    fn optode_split() {
        let cloud = sample();
        let (fid, opt) = cloud.split_at_optodes().unwrap();
        assert_eq!(fid.len(), 2);
        assert_eq!(opt.len(), 2);
        assert_eq!(cloud.optode_start().unwrap(), 2);
    }

    #[test]
    fn optode_split_requires_optodes() {
        let cloud = LabeledCloud::from_pairs([("cz", Pt3::origin())]);
        assert_eq!(cloud.optode_start().unwrap_err(), CloudError::NoOptodes);
    }

    #[test]
    fn fiducial_after_optode_is_rejected() {
        let cloud = LabeledCloud::from_pairs([
            (Label::from(0), Pt3::origin()),
            (Label::from("cz"), Pt3::origin()),
        ]);
        assert_eq!(
            cloud.optode_start().unwrap_err(),
            CloudError::InterleavedLabels { index: 1 }
        );
    }

    #[test]
    fn json_labels_are_untagged() {
        let json = r#"{"labels":["cz",0],"points":[[0.0,0.0,9.0],[1.0,2.0,3.0]]}"#;
        let cloud: LabeledCloud = serde_json::from_str(json).unwrap();
        assert_eq!(cloud.labels()[0], Label::from("cz"));
        assert_eq!(cloud.labels()[1], Label::Optode(0));

        let bad = r#"{"labels":["cz"],"points":[]}"#;
        assert!(serde_json::from_str::<LabeledCloud>(bad).is_err());
    }
}
