// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sleevekit_core::SleeveConfig;
use sleevekit_core::error::Result;
use sleevekit_imaging::{ImageProcessor, fingerprint};

use super::RunCommand;

#[derive(Parser, Debug, Clone)]
pub struct FingerprintCommand {
    /// Image to fingerprint
    pub image: PathBuf,
}

impl RunCommand for FingerprintCommand {
    fn run(&self, _config: &SleeveConfig) -> Result<ExitCode> {
        let image = ImageProcessor::open(&self.image)?;
        let pair = fingerprint(image.as_dynamic());
        println!("{}", serde_json::to_string_pretty(&pair)?);
        Ok(ExitCode::SUCCESS)
    }
}
