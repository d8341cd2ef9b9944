// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use sleevekit_core::SleeveConfig;
use sleevekit_core::error::{Result, SleeveError};
use sleevekit_imaging::ImageProcessor;
use sleevekit_imaging::template::scanner::{FileOutcome, list_candidates, scan_directory_with};

use super::RunCommand;

#[derive(Parser, Debug, Clone)]
pub struct ScanCommand {
    /// Directory of collages or shelf photos to search
    pub directory: PathBuf,
    /// The image to look for
    pub target: PathBuf,
    /// Minimum correlation to count as a match, from 0 to 1
    #[arg(long, value_name = "T")]
    pub threshold: Option<f32>,
    /// Where highlighted copies of the matches are written
    #[arg(long, value_name = "DIR", default_value = "search_results")]
    pub output: PathBuf,
}

fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

impl RunCommand for ScanCommand {
    fn run(&self, config: &SleeveConfig) -> Result<ExitCode> {
        let mut scanner = config.scanner.clone();
        if let Some(threshold) = self.threshold {
            scanner.threshold = threshold;
            scanner.validate()?;
        }

        // The target must decode before any candidate work starts.
        ImageProcessor::open(&self.target).map_err(|err| SleeveError::TargetUnreadable(err.to_string()))?;

        let total = list_candidates(&self.directory, &scanner)?.len();
        let target_name = self
            .target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if total > 0 {
            println!("Starting search for '{target_name}' in {total} files...");
        }

        let pb = ProgressBar::new(total as u64).with_style(pb_style());
        let report = scan_directory_with(&self.directory, &self.target, &self.output, &scanner, |outcome| {
            if let FileOutcome::Matched(found) = outcome {
                pb.println(format!(
                    " >> MATCH FOUND: {} (Confidence: {:.2}%)",
                    found.path.display(),
                    found.match_box.confidence * 100.0
                ));
            }
            pb.inc(1);
        });
        pb.finish_and_clear();
        let report = report?;
        if report.files_scanned == 0 {
            println!("No valid images found in {}", self.directory.display());
            return Ok(ExitCode::SUCCESS);
        }

        println!("Search complete.");
        println!("Total matches found: {}", report.matches.len());
        if !report.skipped.is_empty() {
            println!("Skipped {} unreadable file(s).", report.skipped.len());
        }
        let unsaved = report.unsaved().count();
        if unsaved > 0 {
            println!("{unsaved} highlighted cop(ies) could not be saved.");
        }
        if !report.matches.is_empty() {
            println!("Check the '{}' folder for highlighted results.", self.output.display());
        }
        Ok(ExitCode::SUCCESS)
    }
}
