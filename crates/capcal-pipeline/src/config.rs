//! Pipeline configuration.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use capcal_linear::FrameOptions;
use serde::{Deserialize, Serialize};

use crate::{AtlasOptions, SequenceOptions};

/// Settings for [`crate::run_calibration`].
///
/// Every field has a default, so a partial JSON document such as
/// `{"atlas": {"surface": "scalp"}}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub frame: FrameOptions,
    pub sequence: SequenceOptions,
    pub atlas: AtlasOptions,
    /// Run atlas projection when a projector is supplied.
    pub project_to_atlas: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            frame: FrameOptions::default(),
            sequence: SequenceOptions::default(),
            atlas: AtlasOptions::default(),
            project_to_atlas: true,
        }
    }
}

impl CalibrationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse calibration config")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&data)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameComposition, ProjectionSurface};

    #[test]
    fn partial_config_fills_defaults() {
        let cfg = CalibrationConfig::from_json_str(
            r#"{"atlas": {"surface": "scalp"}, "sequence": {"composition": "cumulative"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.atlas.surface, ProjectionSurface::Scalp);
        assert_eq!(cfg.sequence.composition, FrameComposition::Cumulative);
        assert_eq!(cfg.frame, FrameOptions::default());
        assert!(cfg.project_to_atlas);
    }

    #[test]
    fn json_round_trip() {
        let mut cfg = CalibrationConfig::default();
        cfg.frame.inch_threshold = 6.5;
        cfg.atlas.anchor_names = Some(vec!["cz".into(), "inion".into()]);
        let back = CalibrationConfig::from_json_str(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(CalibrationConfig::from_json_str(r#"{"frame": 3}"#).is_err());
        assert!(CalibrationConfig::from_json_file("/nonexistent/capcal.json").is_err());
    }
}
