// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: the thin wrapper around the `image` crate that every
// component uses to decode, crop, and encode sleeve photographs.

use image::{DynamicImage, ImageFormat};
use sleevekit_core::error::SleeveError;
use tracing::{debug, info, instrument};

/// A single decoded image plus the handful of buffer operations the
/// pipelines need.
///
/// Operations consume `self` and return a new `ImageProcessor`, so calls chain:
///
/// ```ignore
/// ImageProcessor::open("sleeve.jpg")?
///     .crop(10, 10, 300, 300)
///     .save("sleeve-cropped.png")?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    ///
    /// The format is detected from the file's contents rather than its
    /// extension. A missing or unreadable file is reported the same way as
    /// undecodable data.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, SleeveError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|err| SleeveError::UnreadableImage(format!("{}: {}", path.display(), err)))?;
        Self::from_bytes(&data).map_err(|err| match err {
            SleeveError::UnreadableImage(detail) => {
                SleeveError::UnreadableImage(format!("{}: {}", path.display(), detail))
            }
            other => other,
        })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, SleeveError> {
        let img = image::load_from_memory(data)
            .map_err(|err| SleeveError::UnreadableImage(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner; `width` and `height` define the
    /// size of the crop rectangle. The rectangle is clamped to the image, so
    /// the result never reads outside the source.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w.saturating_sub(safe_x));
        let safe_h = height.min(img_h.saturating_sub(safe_y));

        info!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        let cropped = self.image.crop_imm(safe_x, safe_y, safe_w, safe_h);
        Self { image: cropped }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image to a file. The format is inferred from the file
    /// extension; alpha is dropped for formats that cannot store it.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), SleeveError> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path).map_err(|err| {
            SleeveError::ImageEncode(format!("{}: {}", path.display(), err))
        })?;

        let result = if format == ImageFormat::Jpeg && self.image.color().has_alpha() {
            DynamicImage::ImageRgb8(self.image.to_rgb8()).save_with_format(path, format)
        } else {
            self.image.save_with_format(path, format)
        };

        result.map_err(|err| {
            SleeveError::ImageEncode(format!("failed to save image to {}: {}", path.display(), err))
        })
    }
}
