// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core value types exchanged between the imaging components and their callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SleeveError;

/// Number of bits in every perceptual hash.
pub const HASH_BITS: u32 = 64;

/// A 64-bit perceptual hash.
///
/// Bits are laid out row-major over the hash grid with the first cell in the
/// most significant position. The text form is 16 lowercase hex digits, which
/// is also how the hash serializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ImageHash(u64);

impl ImageHash {
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Build a hash from grid cells in row-major order. Missing trailing cells
    /// are zero; anything past 64 cells is ignored.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut value = 0u64;
        let mut count = 0;
        for bit in bits.into_iter().take(HASH_BITS as usize) {
            value = (value << 1) | u64::from(bit);
            count += 1;
        }
        if count < HASH_BITS {
            value <<= HASH_BITS - count;
        }
        Self(value)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Hamming distance: the number of differing bit positions.
    pub const fn distance(self, other: ImageHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ImageHash {
    type Err = SleeveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SleeveError::InvalidHash(format!(
                "expected 16 hex digits, got {:?}",
                s
            )));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|err| SleeveError::InvalidHash(format!("{}: {}", s, err)))
    }
}

impl From<ImageHash> for String {
    fn from(hash: ImageHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for ImageHash {
    type Error = SleeveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The two independent perceptual hashes computed from one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerprintPair {
    /// Difference hash (row-neighbour gradient).
    pub dhash: ImageHash,
    /// Average hash (cell brightness against the grid mean).
    pub ahash: ImageHash,
}

impl FingerprintPair {
    pub const fn new(dhash: ImageHash, ahash: ImageHash) -> Self {
        Self { dhash, ahash }
    }

    /// Per-kind Hamming distances, `(dhash_distance, ahash_distance)`.
    pub const fn distances(&self, other: &FingerprintPair) -> (u32, u32) {
        (self.dhash.distance(other.dhash), self.ahash.distance(other.ahash))
    }
}

/// One stored collection record as seen by the duplicate detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Stable identifier assigned by the collection.
    pub id: String,
    /// Fingerprint stored alongside the record.
    pub hashes: FingerprintPair,
    /// Free-form tags attached to the record.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A corpus entry judged similar to a query fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    /// Identifier of the matching corpus entry.
    pub id: String,
    /// The smaller of the dhash and ahash distances.
    pub distance: u32,
    /// Tags of the matching corpus entry.
    pub tags: Vec<String>,
}

/// Location of a template found inside a larger image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchBox {
    /// Left edge of the match, in candidate pixels.
    pub x: u32,
    /// Top edge of the match, in candidate pixels.
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Correlation score in [0, 1].
    pub confidence: f32,
}

impl MatchBox {
    pub fn top_left(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// Exclusive bottom-right corner.
    pub fn bottom_right(&self) -> (u32, u32) {
        (self.x + self.width, self.y + self.height)
    }
}
