// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for collectors using the upload and scan tools.
//
// Every technical error is mapped to plain English with a clear suggestion,
// and the normal outcomes of normalization and duplicate checks get the
// phrases the collection front end shows.

use crate::error::SleeveError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Disk hiccup or similar; trying again may work.
    Transient,
    /// User must do something (pick another file, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying: the input itself is bad.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `SleeveError` into a `HumanError`.
pub fn humanize_error(err: &SleeveError) -> HumanError {
    match err {
        SleeveError::UnreadableImage(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The file may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::Permanent,
        },

        SleeveError::TargetUnreadable(detail) => HumanError {
            message: "The image to search for couldn't be opened.".into(),
            suggestion: format!("Check the path and that the file is a PNG, JPEG, BMP, or WebP image. ({detail})"),
            severity: Severity::ActionRequired,
        },

        SleeveError::ImageEncode(_) => HumanError {
            message: "The processed image couldn't be saved.".into(),
            suggestion: "Try saving with a .png or .jpg extension.".into(),
            severity: Severity::ActionRequired,
        },

        SleeveError::InvalidHash(_) => HumanError {
            message: "A stored fingerprint is damaged.".into(),
            suggestion: "Re-add the affected record so its fingerprint is computed again.".into(),
            severity: Severity::Permanent,
        },

        SleeveError::InvalidConfig(detail) => HumanError {
            message: "The settings file has a value that can't be used.".into(),
            suggestion: format!("Fix the setting and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        SleeveError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Sleevekit doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    severity: Severity::Transient,
                }
            }
        }

        SleeveError::Serialization(_) => HumanError {
            message: "A data file couldn't be understood.".into(),
            suggestion: "Check that the collection or settings file is valid JSON.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

/// Message shown after an attempt to crop and straighten an upload.
pub fn normalization_message(processed: bool) -> &'static str {
    if processed {
        "Image successfully cropped and straightened!"
    } else {
        "Could not auto-detect sleeve edges. Image will be used as-is."
    }
}

/// Message shown after an insert-time duplicate check.
pub fn insert_message(blocked: bool, similar_found: bool, auto_processed: bool) -> String {
    let mut message = if blocked {
        "This image appears to already be in your collection!".to_string()
    } else if similar_found {
        "Similar images found, but none close enough to stop this one being added.".to_string()
    } else {
        "No duplicates found. Safe to add.".to_string()
    };
    if auto_processed && !blocked {
        message.push_str(" (Auto-cropped and straightened)");
    }
    message
}

/// Message shown after an explicit "is this already in my collection?" check.
pub fn advisory_message(similar_found: bool, auto_processed: bool) -> String {
    if !similar_found {
        return "No similar images found in your collection.".to_string();
    }
    let mut message = "Similar images found!".to_string();
    if auto_processed {
        message.push_str(" (Image was auto-processed for better comparison)");
    }
    message
}
