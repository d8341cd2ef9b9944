// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sleevekit_core::SleeveConfig;
use sleevekit_core::error::Result;
use sleevekit_core::human_errors::normalization_message;
use sleevekit_imaging::normalize::RectifyMethod;
use sleevekit_imaging::{ImageProcessor, Normalized, SleeveNormalizer};
use tracing::{info, warn};

use super::RunCommand;

#[derive(Parser, Debug, Clone)]
pub struct NormalizeCommand {
    /// Photo of the sleeve
    pub input: PathBuf,
    /// Where to write the result; the extension picks the format
    pub output: PathBuf,
}

impl RunCommand for NormalizeCommand {
    fn run(&self, config: &SleeveConfig) -> Result<ExitCode> {
        let normalizer = SleeveNormalizer::new(config.normalizer.clone())?;
        let processed = match ImageProcessor::open(&self.input) {
            Ok(processor) => {
                let result = normalizer.normalize(processor.into_dynamic());
                match &result {
                    Normalized::Rectified { method: RectifyMethod::Perspective(quad), .. } => {
                        info!(corners = ?quad.corners(), "Perspective corrected");
                    }
                    Normalized::Rectified { method: RectifyMethod::PaddedCrop(rect), .. } => {
                        info!(?rect, "Cropped to bounding box");
                    }
                    Normalized::Unprocessed { reason, .. } => {
                        info!(?reason, "Keeping original");
                    }
                }
                let processed = result.is_processed();
                ImageProcessor::from_dynamic(result.into_image()).save(&self.output)?;
                processed
            }
            Err(err) => {
                warn!(error = %err, "Could not decode input; copying it unchanged");
                fs::copy(&self.input, &self.output)?;
                false
            }
        };

        println!("{}", normalization_message(processed));
        Ok(ExitCode::SUCCESS)
    }
}
