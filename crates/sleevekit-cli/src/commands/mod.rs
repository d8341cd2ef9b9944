// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

mod check;
mod fingerprint;
mod normalize;
mod scan;

use std::process::ExitCode;

use sleevekit_core::SleeveConfig;
use sleevekit_core::error::Result;

pub use check::{CheckCommand, CheckMode};
pub use fingerprint::FingerprintCommand;
pub use normalize::NormalizeCommand;
pub use scan::ScanCommand;

/// A subcommand that runs against the loaded settings.
pub trait RunCommand {
    fn run(&self, config: &SleeveConfig) -> Result<ExitCode>;
}
