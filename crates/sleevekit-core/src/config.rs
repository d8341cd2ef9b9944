// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tunable parameters for the normalizer, the duplicate policy, and the
// template scanner.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SleeveError};

/// All Sleevekit settings. Every section falls back to its defaults when
/// absent from a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleeveConfig {
    pub normalizer: NormalizerConfig,
    pub duplicates: DuplicatePolicy,
    pub scanner: ScannerConfig,
}

impl SleeveConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipelines cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.normalizer.validate()?;
        self.scanner.validate()
    }
}

/// Parameters of the sleeve detection and rectification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Gaussian sigma. 1.1 is what a 5x5 kernel implies.
    pub blur_sigma: f32,
    /// Canny (low, high) pairs; the edge maps are OR-ed together.
    pub canny_thresholds: Vec<(f32, f32)>,
    /// Chebyshev radius of the square dilation element (2 gives 5x5).
    pub dilate_radius: u8,
    pub dilate_iterations: u32,
    /// Minimum contour area as a fraction of the image area.
    pub min_area_fraction: f64,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_fraction: f64,
    /// Pixels added on each side of the bounding-box fallback crop.
    pub fallback_padding: u32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_thresholds: vec![(30.0, 150.0), (50.0, 200.0)],
            dilate_radius: 2,
            dilate_iterations: 2,
            min_area_fraction: 0.10,
            approx_epsilon_fraction: 0.02,
            fallback_padding: 10,
        }
    }
}

impl NormalizerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.blur_sigma > 0.0) {
            return Err(SleeveError::InvalidConfig(format!(
                "normalizer.blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.canny_thresholds.is_empty() {
            return Err(SleeveError::InvalidConfig(
                "normalizer.canny_thresholds must not be empty".into(),
            ));
        }
        if let Some((low, high)) = self
            .canny_thresholds
            .iter()
            .find(|(low, high)| !(*low >= 0.0 && low <= high))
        {
            return Err(SleeveError::InvalidConfig(format!(
                "normalizer.canny_thresholds: invalid pair ({}, {})",
                low, high
            )));
        }
        if !(self.min_area_fraction > 0.0 && self.min_area_fraction <= 1.0) {
            return Err(SleeveError::InvalidConfig(format!(
                "normalizer.min_area_fraction must be in (0, 1], got {}",
                self.min_area_fraction
            )));
        }
        if !(self.approx_epsilon_fraction > 0.0 && self.approx_epsilon_fraction <= 1.0) {
            return Err(SleeveError::InvalidConfig(format!(
                "normalizer.approx_epsilon_fraction must be in (0, 1], got {}",
                self.approx_epsilon_fraction
            )));
        }
        Ok(())
    }
}

/// Caller-side thresholds for acting on duplicate-detector results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicatePolicy {
    /// Distance at or below which an insert is refused outright.
    pub block_threshold: u32,
    /// Ranking threshold used while inserting.
    pub warn_threshold: u32,
    /// Ranking threshold used by an explicit duplicate check.
    pub advisory_threshold: u32,
    /// Best distance at or below which an explicit check reports a duplicate.
    pub advisory_duplicate_threshold: u32,
    /// Maximum number of matches an explicit check returns.
    pub advisory_limit: usize,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            block_threshold: 3,
            warn_threshold: 5,
            advisory_threshold: 10,
            advisory_duplicate_threshold: 5,
            advisory_limit: 5,
        }
    }
}

/// Settings of the batch template scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Minimum correlation for a match, in [0, 1].
    pub threshold: f32,
    /// File extensions (case-insensitive, without the dot) that get scanned.
    pub extensions: Vec<String>,
    /// Prefix of the annotated copies written for each match.
    pub output_prefix: String,
    /// RGB colour of the match rectangle.
    pub box_color: [u8; 3],
    pub box_thickness: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.95,
            extensions: ["png", "jpg", "jpeg", "bmp", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            output_prefix: "found_".into(),
            box_color: [255, 0, 0],
            box_thickness: 5,
        }
    }
}

impl ScannerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SleeveError::InvalidConfig(format!(
                "scanner.threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        if self.box_thickness == 0 {
            return Err(SleeveError::InvalidConfig(
                "scanner.box_thickness must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Whether `path` has one of the configured extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        assert!(SleeveConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"scanner": {{"threshold": 0.8}}}}"#).unwrap();

        let config = SleeveConfig::load(file.path()).unwrap();
        assert_eq!(config.scanner.threshold, 0.8);
        assert_eq!(config.scanner.output_prefix, "found_");
        assert_eq!(config.duplicates, DuplicatePolicy::default());
        assert_eq!(config.normalizer.fallback_padding, 10);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = SleeveConfig::default();
        config.scanner.threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(SleeveError::InvalidConfig(_))
        ));
    }

    #[test]
    fn inverted_canny_pair_is_rejected() {
        let mut config = SleeveConfig::default();
        config.normalizer.canny_thresholds = vec![(200.0, 50.0)];
        assert!(config.validate().is_err());
    }

    #[test]
    fn extension_filter_ignores_case() {
        let scanner = ScannerConfig::default();
        assert!(scanner.accepts(Path::new("a/Collage.JPG")));
        assert!(scanner.accepts(Path::new("b.webp")));
        assert!(!scanner.accepts(Path::new("notes.txt")));
        assert!(!scanner.accepts(Path::new("README")));
    }
}
