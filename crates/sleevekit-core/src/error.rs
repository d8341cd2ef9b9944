// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Sleevekit.

use thiserror::Error;

/// Top-level error type for all Sleevekit operations.
///
/// "Nothing found" outcomes (no sleeve detected, degenerate geometry, no
/// similar images, no template match) are ordinary results and never appear
/// here.
#[derive(Debug, Error)]
pub enum SleeveError {
    // -- Image errors --
    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    #[error("target image could not be read: {0}")]
    TargetUnreadable(String),

    #[error("image encoding failed: {0}")]
    ImageEncode(String),

    // -- Fingerprint errors --
    #[error("invalid perceptual hash: {0}")]
    InvalidHash(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SleeveError>;
