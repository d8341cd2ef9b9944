// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sleevekit: command-line front end for sleeve normalization, duplicate
// checks against a collection, and template scanning.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sleevekit_core::SleeveConfig;
use sleevekit_core::error::Result;
use sleevekit_core::human_errors::humanize_error;
use tracing_subscriber::EnvFilter;

use commands::{CheckCommand, FingerprintCommand, NormalizeCommand, RunCommand, ScanCommand};

#[derive(Parser, Debug)]
#[command(name = "sleevekit", version, about)]
struct Opts {
    #[command(subcommand)]
    subcmd: SubCommand,
    /// JSON settings file; missing sections keep their defaults
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Crop and straighten the sleeve in a photo
    Normalize(NormalizeCommand),
    /// Print an image's perceptual fingerprint pair
    Fingerprint(FingerprintCommand),
    /// Check an image against a collection for duplicates
    Check(CheckCommand),
    /// Search a directory of images for a target image
    Scan(ScanCommand),
}

fn main() -> ExitCode {
    let opts = Opts::parse();

    let filter = if opts.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&opts) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Opts) -> Result<ExitCode> {
    let config = match &opts.config {
        Some(path) => SleeveConfig::load(path)?,
        None => SleeveConfig::default(),
    };

    match &opts.subcmd {
        SubCommand::Normalize(cmd) => cmd.run(&config),
        SubCommand::Fingerprint(cmd) => cmd.run(&config),
        SubCommand::Check(cmd) => cmd.run(&config),
        SubCommand::Scan(cmd) => cmd.run(&config),
    }
}
