// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use sleevekit_core::error::Result;
use sleevekit_core::human_errors::{advisory_message, insert_message};
use sleevekit_core::{CorpusEntry, FingerprintPair, SleeveConfig};
use sleevekit_imaging::fingerprint::{DuplicateReport, InsertVerdict, check_advisory, check_insert};
use sleevekit_imaging::{ImageProcessor, SleeveNormalizer, fingerprint};
use tracing::{debug, info};

use super::RunCommand;

/// Exit status when an insert would be refused.
const BLOCKED_EXIT: u8 = 2;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Decide whether the image may be added (blocks near-exact copies)
    Insert,
    /// Report similar records without blocking anything
    Advisory,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckCommand {
    /// Image to check
    pub image: PathBuf,
    /// JSON array of stored records, each with `id`, `hashes` and optional `tags`
    #[arg(long, value_name = "FILE")]
    pub corpus: PathBuf,
    #[arg(long, value_enum, default_value_t = CheckMode::Insert)]
    pub mode: CheckMode,
    /// Fingerprint the image as given instead of cropping it first
    #[arg(long)]
    pub no_normalize: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Outcome {
    Insert(InsertVerdict),
    Advisory(DuplicateReport),
}

#[derive(Serialize)]
struct CheckOutput {
    fingerprint: FingerprintPair,
    auto_processed: bool,
    result: Outcome,
    message: String,
}

fn load_corpus(path: &Path) -> Result<Vec<CorpusEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let corpus: Vec<CorpusEntry> = serde_json::from_reader(reader)?;
    debug!(records = corpus.len(), "Corpus loaded");
    Ok(corpus)
}

impl RunCommand for CheckCommand {
    fn run(&self, config: &SleeveConfig) -> Result<ExitCode> {
        let corpus = load_corpus(&self.corpus)?;
        let image = ImageProcessor::open(&self.image)?.into_dynamic();

        let (image, auto_processed) = if self.no_normalize {
            (image, false)
        } else {
            let result = SleeveNormalizer::new(config.normalizer.clone())?.normalize(image);
            let processed = result.is_processed();
            (result.into_image(), processed)
        };
        let pair = fingerprint(&image);
        info!(dhash = %pair.dhash, ahash = %pair.ahash, "Fingerprinted");

        let policy = &config.duplicates;
        let (result, message, blocked) = match self.mode {
            CheckMode::Insert => {
                let verdict = check_insert(policy, &pair, &corpus);
                let blocked = matches!(verdict, InsertVerdict::Blocked { .. });
                let similar = !matches!(verdict, InsertVerdict::Clear);
                let message = insert_message(blocked, similar, auto_processed);
                (Outcome::Insert(verdict), message, blocked)
            }
            CheckMode::Advisory => {
                let report = check_advisory(policy, &pair, &corpus);
                let message = advisory_message(!report.similar.is_empty(), auto_processed);
                (Outcome::Advisory(report), message, false)
            }
        };

        let output = CheckOutput {
            fingerprint: pair,
            auto_processed,
            result,
            message,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);

        Ok(if blocked {
            ExitCode::from(BLOCKED_EXIT)
        } else {
            ExitCode::SUCCESS
        })
    }
}
