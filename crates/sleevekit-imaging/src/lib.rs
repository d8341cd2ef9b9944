// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sleevekit-imaging: The image-analysis core of Sleevekit.
//
// Provides sleeve detection and rectification (contour finding, corner
// ordering, perspective warp with a padded-crop fallback), perceptual
// fingerprints with duplicate ranking, and normalized cross-correlation
// template scanning over batches of composite images.

pub mod fingerprint;
pub mod image;
pub mod normalize;
pub mod template;

// Re-export the primary entry points so callers can use
// `sleevekit_imaging::SleeveNormalizer` etc.
pub use fingerprint::{fingerprint, rank_similar};
pub use crate::image::processor::ImageProcessor;
pub use normalize::{Normalized, SleeveNormalizer};
pub use template::scanner::{ScanReport, scan, scan_directory};
