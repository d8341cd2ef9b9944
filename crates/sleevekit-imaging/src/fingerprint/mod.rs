// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perceptual duplicate detection: fingerprinting, Hamming-distance ranking,
// and the insert/advisory duplicate policy.

pub mod hash;
pub mod policy;
pub mod similarity;

pub use hash::fingerprint;
pub use policy::{DuplicateReport, InsertVerdict, check_advisory, check_insert};
pub use similarity::rank_similar;
