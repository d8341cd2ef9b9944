// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch template scanner: match one target image against many candidates,
// in parallel, and save highlighted copies of the hits.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use serde::Serialize;
use sleevekit_core::error::{Result, SleeveError};
use sleevekit_core::{MatchBox, ScannerConfig};
use tracing::{debug, info, instrument, warn};

use super::annotate;
use super::ncc::best_match;
use crate::image::processor::ImageProcessor;

/// Find `target` in each candidate.
///
/// Returns the candidates whose best correlation reaches `threshold`, each
/// with a box the size of the target at the best offset. Output follows
/// candidate order. Candidates smaller than the target never match.
pub fn scan<I: Clone + Send + Sync>(
    target: &DynamicImage,
    candidates: &[(I, DynamicImage)],
    threshold: f32,
) -> Vec<(I, MatchBox)> {
    let target = target.to_rgb8();
    candidates
        .par_iter()
        .filter_map(|(id, candidate)| {
            match_candidate(&target, candidate, threshold).map(|found| (id.clone(), found))
        })
        .collect()
}

fn match_candidate(target: &RgbImage, candidate: &DynamicImage, threshold: f32) -> Option<MatchBox> {
    let peak = best_match(&candidate.to_rgb8(), target)?;
    debug!(x = peak.x, y = peak.y, score = peak.score, "Best correlation");
    (peak.score >= threshold).then(|| MatchBox {
        x: peak.x,
        y: peak.y,
        width: target.width(),
        height: target.height(),
        confidence: peak.score,
    })
}

/// One candidate file in which the target was found.
#[derive(Debug, Clone, Serialize)]
pub struct FileMatch {
    pub path: PathBuf,
    /// Where the annotated copy was written; `None` if saving it failed.
    pub output: Option<PathBuf>,
    pub match_box: MatchBox,
}

/// Summary of a directory scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Candidate files with an accepted extension, readable or not.
    pub files_scanned: usize,
    /// Candidates that could not be decoded.
    pub skipped: Vec<PathBuf>,
    /// Sorted by file name.
    pub matches: Vec<FileMatch>,
}

impl ScanReport {
    /// Matches whose annotated copy could not be written.
    pub fn unsaved(&self) -> impl Iterator<Item = &FileMatch> {
        self.matches.iter().filter(|found| found.output.is_none())
    }
}

/// What happened to a single candidate file; passed to progress callbacks.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Matched(FileMatch),
    NoMatch(PathBuf),
    Skipped(PathBuf),
}

/// Image files directly inside `dir` whose extension the config accepts,
/// sorted by name.
pub fn list_candidates(dir: &Path, config: &ScannerConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && config.accepts(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Scan every image in `dir` for `target_path`, writing highlighted copies of
/// the matches into `output_dir`.
pub fn scan_directory(
    dir: impl AsRef<Path>,
    target_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ScannerConfig,
) -> Result<ScanReport> {
    scan_directory_with(dir, target_path, output_dir, config, |_| {})
}

/// Like [`scan_directory`], calling `on_file` as each candidate finishes.
///
/// The target is loaded before any candidate is touched; if it cannot be
/// decoded the whole scan fails with [`SleeveError::TargetUnreadable`].
/// Unreadable candidates are skipped, and a match whose annotated copy
/// cannot be written is still reported, without an output path.
#[instrument(skip_all, fields(dir = %dir.as_ref().display(), target = %target_path.as_ref().display()))]
pub fn scan_directory_with(
    dir: impl AsRef<Path>,
    target_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ScannerConfig,
    on_file: impl Fn(&FileOutcome) + Sync,
) -> Result<ScanReport> {
    let target = ImageProcessor::open(target_path.as_ref())
        .map_err(|err| SleeveError::TargetUnreadable(err.to_string()))?
        .into_dynamic()
        .to_rgb8();

    let files = list_candidates(dir.as_ref(), config)?;
    if files.is_empty() {
        info!("No candidate images found");
        return Ok(ScanReport::default());
    }
    info!(files = files.len(), "Scanning candidates");

    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| {
            let outcome = scan_file(path, &target, output_dir, config);
            on_file(&outcome);
            outcome
        })
        .collect();

    let mut report = ScanReport {
        files_scanned: files.len(),
        ..ScanReport::default()
    };
    for outcome in outcomes {
        match outcome {
            FileOutcome::Matched(found) => report.matches.push(found),
            FileOutcome::Skipped(path) => report.skipped.push(path),
            FileOutcome::NoMatch(_) => {}
        }
    }
    info!(
        matches = report.matches.len(),
        skipped = report.skipped.len(),
        "Scan complete"
    );
    Ok(report)
}

fn scan_file(path: &Path, target: &RgbImage, output_dir: &Path, config: &ScannerConfig) -> FileOutcome {
    let candidate = match ImageProcessor::open(path) {
        Ok(processor) => processor.into_dynamic(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Skipping unreadable candidate");
            return FileOutcome::Skipped(path.to_path_buf());
        }
    };

    let Some(match_box) = match_candidate(target, &candidate, config.threshold) else {
        return FileOutcome::NoMatch(path.to_path_buf());
    };

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output = output_dir.join(format!("{}{}", config.output_prefix, file_name));
    let highlighted = annotate(&candidate, &match_box, config.box_color, config.box_thickness);
    let output = match ImageProcessor::from_dynamic(highlighted).save(&output) {
        Ok(()) => Some(output),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Could not save annotated copy");
            None
        }
    };

    info!(
        path = %path.display(),
        confidence = match_box.confidence,
        "Target found"
    );
    FileOutcome::Matched(FileMatch {
        path: path.to_path_buf(),
        output,
        match_box,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn noise_rgb(width: u32, height: u32, seed: u32) -> RgbImage {
        let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]))
    }

    fn composite_with(target: &RgbImage, x0: u32, y0: u32, seed: u32) -> RgbImage {
        let mut canvas = noise_rgb(1000, 1000, seed);
        image::imageops::replace(&mut canvas, target, x0 as i64, y0 as i64);
        canvas
    }

    #[test]
    fn pasted_target_is_found_in_large_composite() {
        let target = noise_rgb(50, 50, 42);
        let composite = composite_with(&target, 200, 300, 17);

        let found = scan(
            &DynamicImage::ImageRgb8(target),
            &[("collage", DynamicImage::ImageRgb8(composite))],
            0.95,
        );

        assert_eq!(found.len(), 1);
        let (id, b) = &found[0];
        assert_eq!(*id, "collage");
        assert!(b.x.abs_diff(200) <= 1 && b.y.abs_diff(300) <= 1, "found at {:?}", b.top_left());
        assert_eq!((b.width, b.height), (50, 50));
        assert!(b.confidence >= 0.99, "confidence {}", b.confidence);
    }

    #[test]
    fn unrelated_candidates_and_small_candidates_do_not_match() {
        let target = DynamicImage::ImageRgb8(noise_rgb(20, 20, 1));
        let candidates = vec![
            (0, DynamicImage::ImageRgb8(noise_rgb(120, 120, 2))),
            (1, DynamicImage::ImageRgb8(noise_rgb(10, 10, 3))),
        ];
        assert!(scan(&target, &candidates, 0.95).is_empty());
    }

    #[test]
    fn directory_scan_annotates_matches_and_skips_broken_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("results");
        let target = noise_rgb(24, 24, 5);

        let target_path = dir.path().join("target.png");
        target.save(&target_path).unwrap();

        let mut hit = noise_rgb(160, 120, 6);
        image::imageops::replace(&mut hit, &target, 70, 40);
        let candidates = dir.path().join("candidates");
        fs::create_dir(&candidates).unwrap();
        hit.save(candidates.join("b_hit.png")).unwrap();
        noise_rgb(160, 120, 7).save(candidates.join("a_miss.PNG")).unwrap();
        fs::write(candidates.join("c_broken.jpg"), b"not an image").unwrap();
        fs::write(candidates.join("notes.txt"), b"ignored").unwrap();

        let report = scan_directory(&candidates, &target_path, &out, &ScannerConfig::default()).unwrap();

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.skipped, vec![candidates.join("c_broken.jpg")]);
        assert_eq!(report.matches.len(), 1);
        let found = &report.matches[0];
        assert_eq!(found.output, Some(out.join("found_b_hit.png")));
        assert_eq!(found.match_box.top_left(), (70, 40));

        let saved = image::open(out.join("found_b_hit.png")).unwrap().to_rgb8();
        assert_eq!(saved.get_pixel(70, 40), &Rgb([255, 0, 0]));
    }

    #[test]
    fn unreadable_target_fails_before_scanning() {
        let dir = TempDir::new().unwrap();
        let target_path = dir.path().join("target.png");
        fs::write(&target_path, b"garbage").unwrap();
        noise_rgb(30, 30, 9).save(dir.path().join("candidate.png")).unwrap();

        let out = dir.path().join("results");
        let err = scan_directory(dir.path(), &target_path, &out, &ScannerConfig::default()).unwrap_err();
        assert!(matches!(err, SleeveError::TargetUnreadable(_)));
        assert!(!out.exists());
    }

    #[test]
    fn empty_directory_gives_empty_report() {
        let dir = TempDir::new().unwrap();
        let target_path = dir.path().join("target.bmp");
        noise_rgb(8, 8, 3).save(&target_path).unwrap();
        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();

        let report = scan_directory(&empty, &target_path, dir.path().join("out"), &ScannerConfig::default()).unwrap();
        assert_eq!(report.files_scanned, 0);
        assert!(report.matches.is_empty());
    }

    #[test]
    fn recoloured_copy_of_target_is_not_a_match() {
        let pattern = noise_rgb(40, 40, 8);
        let red = RgbImage::from_fn(40, 40, |x, y| Rgb([pattern.get_pixel(x, y).0[0], 0, 0]));
        let green = RgbImage::from_fn(40, 40, |x, y| Rgb([0, pattern.get_pixel(x, y).0[0], 0]));
        let mut canvas = RgbImage::new(200, 200);
        image::imageops::replace(&mut canvas, &green, 80, 60);

        let found = scan(
            &DynamicImage::ImageRgb8(red),
            &[("reprint", DynamicImage::ImageRgb8(canvas))],
            0.95,
        );
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn failed_annotated_save_keeps_the_match() {
        let dir = TempDir::new().unwrap();
        let target = noise_rgb(16, 16, 12);
        let target_path = dir.path().join("target.png");
        target.save(&target_path).unwrap();

        let candidates = dir.path().join("candidates");
        fs::create_dir(&candidates).unwrap();
        let mut hit = noise_rgb(80, 60, 13);
        image::imageops::replace(&mut hit, &target, 30, 20);
        hit.save(candidates.join("hit.png")).unwrap();

        // The prefix points into a directory that is never created.
        let config = ScannerConfig {
            output_prefix: "missing/found_".into(),
            ..ScannerConfig::default()
        };
        let report = scan_directory(&candidates, &target_path, dir.path().join("out"), &config).unwrap();

        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].match_box.top_left(), (30, 20));
        assert_eq!(report.matches[0].output, None);
        assert_eq!(report.unsaved().count(), 1);
    }
}
