// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ranking stored fingerprints by their Hamming distance to a query.

use sleevekit_core::{CorpusEntry, FingerprintPair, SimilarityMatch};
use tracing::debug;

/// Find corpus entries similar to `target`.
///
/// An entry qualifies when *either* its dhash or its ahash distance is within
/// `threshold`, which errs towards flagging too much rather than missing a
/// duplicate. Each match carries the smaller of the two distances, and the
/// result is sorted by it. Entries at equal distance keep corpus order.
pub fn rank_similar<'a>(
    target: &FingerprintPair,
    corpus: impl IntoIterator<Item = &'a CorpusEntry>,
    threshold: u32,
) -> Vec<SimilarityMatch> {
    let mut similar: Vec<SimilarityMatch> = corpus
        .into_iter()
        .filter_map(|entry| {
            let (dhash_dist, ahash_dist) = target.distances(&entry.hashes);
            (dhash_dist <= threshold || ahash_dist <= threshold).then(|| SimilarityMatch {
                id: entry.id.clone(),
                distance: dhash_dist.min(ahash_dist),
                tags: entry.tags.clone(),
            })
        })
        .collect();

    similar.sort_by_key(|m| m.distance);
    debug!(threshold, matches = similar.len(), "Corpus ranked");
    similar
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleevekit_core::ImageHash;

    const BASE: u64 = 0x8f3c_a510_77e2_0c9b;

    fn entry(id: &str, dhash: u64, ahash: u64) -> CorpusEntry {
        CorpusEntry {
            id: id.into(),
            hashes: FingerprintPair::new(ImageHash::new(dhash), ImageHash::new(ahash)),
            tags: vec![format!("tag-{id}")],
        }
    }

    /// Flip the lowest `n` bits.
    fn flip(bits: u64, n: u32) -> u64 {
        bits ^ ((1u64 << n) - 1)
    }

    fn target() -> FingerprintPair {
        FingerprintPair::new(ImageHash::new(BASE), ImageHash::new(!BASE))
    }

    #[test]
    fn single_near_entry_is_returned_first() {
        let corpus = vec![
            entry("far-1", flip(BASE, 30), BASE),
            entry("near", flip(BASE, 2), BASE),
            entry("far-2", !BASE, flip(BASE, 25)),
            entry("far-3", flip(BASE, 21), flip(!BASE, 40)),
        ];

        let ranked = rank_similar(&target(), &corpus, 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "near");
        assert_eq!(ranked[0].distance, 2);
        assert_eq!(ranked[0].tags, vec!["tag-near".to_string()]);
    }

    #[test]
    fn either_hash_within_threshold_qualifies() {
        let corpus = vec![
            entry("by-dhash", flip(BASE, 4), BASE),
            entry("by-ahash", !BASE, flip(!BASE, 1)),
        ];
        let ranked = rank_similar(&target(), &corpus, 4);
        let ids: Vec<_> = ranked.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["by-ahash", "by-dhash"]);
        assert_eq!(ranked[0].distance, 1);
        assert_eq!(ranked[1].distance, 4);
    }

    #[test]
    fn distance_is_the_smaller_of_the_two() {
        let corpus = vec![entry("x", flip(BASE, 9), flip(!BASE, 3))];
        let ranked = rank_similar(&target(), &corpus, 3);
        assert_eq!(ranked[0].distance, 3);
    }

    #[test]
    fn ties_keep_corpus_order() {
        let corpus = vec![
            entry("first", flip(BASE, 1), BASE),
            entry("second", !BASE, flip(!BASE, 1)),
            entry("exact", BASE, !BASE),
        ];
        let ids: Vec<_> = rank_similar(&target(), &corpus, 10)
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, ["exact", "first", "second"]);
    }

    #[test]
    fn empty_corpus_gives_nothing() {
        let corpus: Vec<CorpusEntry> = Vec::new();
        assert!(rank_similar(&target(), &corpus, 64).is_empty());
    }
}
