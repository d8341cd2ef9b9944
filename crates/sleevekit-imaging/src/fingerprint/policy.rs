// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Applying a `DuplicatePolicy` to ranked matches: hard blocks on insert and
// advisory "maybe similar" reports.

use serde::Serialize;
use sleevekit_core::{CorpusEntry, DuplicatePolicy, FingerprintPair, SimilarityMatch};
use tracing::info;

use super::similarity::rank_similar;

/// Decision for adding a new image to the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum InsertVerdict {
    /// The closest match is within the block threshold; refuse the insert.
    Blocked { best: SimilarityMatch },
    /// Some matches are within the warning threshold but none block.
    Similar { matches: Vec<SimilarityMatch> },
    /// Nothing similar.
    Clear,
}

/// Result of an explicit duplicate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    pub is_duplicate: bool,
    /// Closest matches first, at most `advisory_limit` of them.
    pub similar: Vec<SimilarityMatch>,
}

/// Rank at the warning threshold and block if the best match is close enough.
pub fn check_insert<'a>(
    policy: &DuplicatePolicy,
    fingerprint: &FingerprintPair,
    corpus: impl IntoIterator<Item = &'a CorpusEntry>,
) -> InsertVerdict {
    let mut matches = rank_similar(fingerprint, corpus, policy.warn_threshold);
    match matches.first() {
        Some(best) if best.distance <= policy.block_threshold => {
            info!(id = %best.id, distance = best.distance, "Insert blocked as duplicate");
            InsertVerdict::Blocked {
                best: matches.swap_remove(0),
            }
        }
        Some(_) => InsertVerdict::Similar { matches },
        None => InsertVerdict::Clear,
    }
}

/// Rank at the advisory threshold and report the closest few.
pub fn check_advisory<'a>(
    policy: &DuplicatePolicy,
    fingerprint: &FingerprintPair,
    corpus: impl IntoIterator<Item = &'a CorpusEntry>,
) -> DuplicateReport {
    let mut similar = rank_similar(fingerprint, corpus, policy.advisory_threshold);
    let is_duplicate = similar
        .first()
        .is_some_and(|best| best.distance <= policy.advisory_duplicate_threshold);
    similar.truncate(policy.advisory_limit);
    DuplicateReport {
        is_duplicate,
        similar,
    }
}
