// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sleeve normalization: find the dominant sleeve in a photograph and return
// it cropped and straightened.

pub mod contour;
pub mod geometry;

use image::{DynamicImage, GrayImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use sleevekit_core::NormalizerConfig;
use sleevekit_core::error::Result;
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;
use contour::PixelRect;
use geometry::{OrderedQuad, PointQuad};

pub use geometry::rectify;

/// Outcome of [`SleeveNormalizer::normalize`].
///
/// Failing to find a sleeve is not an error: the original image comes back
/// in `Unprocessed` together with the reason.
#[derive(Debug, Clone)]
pub enum Normalized {
    /// The sleeve was found and the image was cropped or warped.
    Rectified {
        image: DynamicImage,
        method: RectifyMethod,
    },
    /// Nothing usable was found; `original` is the untouched input.
    Unprocessed {
        original: DynamicImage,
        reason: UnprocessedReason,
    },
}

/// How a rectified image was produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RectifyMethod {
    /// A four-cornered outline was warped flat.
    Perspective(OrderedQuad),
    /// The outline's bounding box, padded and clamped, was cropped.
    PaddedCrop(PixelRect),
}

/// Why no rectification happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnprocessedReason {
    /// No contour, or none covering enough of the image.
    NoObjectDetected,
    /// The detected region would produce an empty output.
    DegenerateGeometry,
}

impl Normalized {
    pub fn is_processed(&self) -> bool {
        matches!(self, Normalized::Rectified { .. })
    }

    /// The image to continue with: rectified output or the original.
    pub fn image(&self) -> &DynamicImage {
        match self {
            Normalized::Rectified { image, .. } => image,
            Normalized::Unprocessed { original, .. } => original,
        }
    }

    pub fn into_image(self) -> DynamicImage {
        match self {
            Normalized::Rectified { image, .. } => image,
            Normalized::Unprocessed { original, .. } => original,
        }
    }
}

/// Detects a roughly rectangular sleeve against a plain background.
///
/// Stateless apart from its configuration; one instance can serve any number
/// of images, from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct SleeveNormalizer {
    config: NormalizerConfig,
}

impl SleeveNormalizer {
    /// Build a normalizer, rejecting settings the edge detector cannot run
    /// with (such as a Canny pair whose low threshold exceeds the high one).
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Find the sleeve in `image` and return it rectified.
    ///
    /// ## Pipeline
    ///
    /// 1. Grayscale and Gaussian blur
    /// 2. Canny at every configured threshold pair, OR-ed together
    /// 3. Square dilation to close gaps in the outline
    /// 4. Largest external contour; rejected below the minimum area fraction
    /// 5. Douglas-Peucker simplification at a fraction of the perimeter
    /// 6. Four vertices: order the corners and warp to a rectangle.
    ///    Otherwise: crop the padded bounding box.
    ///
    /// Never panics on small or blank inputs; those come back `Unprocessed`.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn normalize(&self, image: DynamicImage) -> Normalized {
        let (width, height) = (image.width(), image.height());

        // Canny needs a 3x3 neighbourhood.
        if width < 3 || height < 3 {
            warn!("Image too small to search for a sleeve; returning unchanged");
            return unprocessed(image, UnprocessedReason::NoObjectDetected);
        }

        let edges = self.edge_map(&image.to_luma8());

        let Some((outline, area)) = contour::largest_external_contour(&edges) else {
            warn!("No contours found; returning unchanged");
            return unprocessed(image, UnprocessedReason::NoObjectDetected);
        };

        let min_area = width as f64 * height as f64 * self.config.min_area_fraction;
        if area < min_area {
            warn!(area, min_area, "Largest contour too small; returning unchanged");
            return unprocessed(image, UnprocessedReason::NoObjectDetected);
        }

        let epsilon = self.config.approx_epsilon_fraction * contour::perimeter(&outline);
        let polygon = contour::approximate_closed_polygon(&outline, epsilon);
        debug!(
            contour_points = outline.len(),
            vertices = polygon.len(),
            area,
            "Contour simplified"
        );

        if let [a, b, c, d] = polygon[..] {
            let quad = PointQuad::new([a, b, c, d].map(|p| (p.x as f32, p.y as f32))).order();
            debug!(
                top_left = ?quad.top_left(),
                top_right = ?quad.top_right(),
                bottom_right = ?quad.bottom_right(),
                bottom_left = ?quad.bottom_left(),
                "Sleeve corners ordered"
            );
            return match rectify(&image, &quad) {
                Some(warped) => {
                    info!(
                        out_w = warped.width(),
                        out_h = warped.height(),
                        "Perspective correction applied"
                    );
                    Normalized::Rectified {
                        image: warped,
                        method: RectifyMethod::Perspective(quad),
                    }
                }
                None => {
                    warn!("Degenerate sleeve outline; returning unchanged");
                    unprocessed(image, UnprocessedReason::DegenerateGeometry)
                }
            };
        }

        let Some(bbox) = contour::bounding_rect(&outline) else {
            return unprocessed(image, UnprocessedReason::NoObjectDetected);
        };
        let crop = contour::padded_rect(bbox, self.config.fallback_padding, width, height);
        if crop.width == 0 || crop.height == 0 {
            warn!(?crop, "Empty fallback crop; returning unchanged");
            return unprocessed(image, UnprocessedReason::DegenerateGeometry);
        }

        info!(
            x = crop.x,
            y = crop.y,
            w = crop.width,
            h = crop.height,
            "No four-corner outline; cropping padded bounding box"
        );
        let cropped = ImageProcessor::from_dynamic(image)
            .crop(crop.x, crop.y, crop.width, crop.height)
            .into_dynamic();
        Normalized::Rectified {
            image: cropped,
            method: RectifyMethod::PaddedCrop(crop),
        }
    }

    /// Blurred, multi-threshold, dilated edge map of a grayscale image.
    pub fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        // gaussian_blur_f32 panics on a non-positive sigma.
        let blurred = if self.config.blur_sigma > 0.0 {
            gaussian_blur_f32(gray, self.config.blur_sigma)
        } else {
            gray.clone()
        };

        let mut edges = GrayImage::new(gray.width(), gray.height());
        for &(low, high) in &self.config.canny_thresholds {
            let pass = canny(&blurred, low, high);
            for (acc, px) in edges.pixels_mut().zip(pass.pixels()) {
                acc.0[0] = acc.0[0].max(px.0[0]);
            }
        }

        (0..self.config.dilate_iterations).fold(edges, |map, _| {
            dilate(&map, Norm::LInf, self.config.dilate_radius)
        })
    }
}

fn unprocessed(original: DynamicImage, reason: UnprocessedReason) -> Normalized {
    Normalized::Unprocessed { original, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn sleeve_on_background(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Rgb([235, 230, 220])
            } else {
                Rgb([25, 30, 35])
            }
        }))
    }

    /// A uniform image has no edges, so the original comes back.
    #[test]
    fn blank_image_is_returned_unprocessed() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 300, Luma([200u8])));
        let result = SleeveNormalizer::default().normalize(img);

        assert!(!result.is_processed());
        match result {
            Normalized::Unprocessed { original, reason } => {
                assert_eq!(reason, UnprocessedReason::NoObjectDetected);
                assert_eq!((original.width(), original.height()), (200, 300));
            }
            other => panic!("expected unprocessed, got {:?}", other),
        }
    }

    #[test]
    fn tiny_image_does_not_panic() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 1, Rgba([128, 128, 128, 255])));
        let result = SleeveNormalizer::default().normalize(img);
        assert!(!result.is_processed());
        assert_eq!(result.image().width(), 2);
    }

    #[test]
    fn small_object_is_rejected() {
        let img = sleeve_on_background(400, 400, 180, 180, 220, 220);
        let result = SleeveNormalizer::default().normalize(img);
        assert!(matches!(
            result,
            Normalized::Unprocessed {
                reason: UnprocessedReason::NoObjectDetected,
                ..
            }
        ));
    }

    #[test]
    fn rectangular_sleeve_is_warped() {
        let img = sleeve_on_background(400, 500, 50, 60, 350, 440);
        let result = SleeveNormalizer::default().normalize(img);

        let Normalized::Rectified { image, method } = result else {
            panic!("sleeve should be detected");
        };
        let RectifyMethod::Perspective(quad) = method else {
            panic!("expected a perspective warp, got {:?}", method);
        };
        // The outline sits just outside the sleeve after dilation.
        let (tlx, tly) = quad.top_left();
        assert!((40.0..=52.0).contains(&tlx) && (50.0..=62.0).contains(&tly), "{:?}", quad);
        assert!((295..=320).contains(&image.width()), "width {}", image.width());
        assert!((375..=400).contains(&image.height()), "height {}", image.height());
    }

    #[test]
    fn round_object_falls_back_to_padded_crop() {
        let (w, h) = (400u32, 400u32);
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            let (dx, dy) = (x as f32 - 200.0, y as f32 - 200.0);
            if dx.hypot(dy) <= 120.0 {
                Rgb([240, 240, 240])
            } else {
                Rgb([20, 20, 20])
            }
        }));

        let result = SleeveNormalizer::default().normalize(img);
        let Normalized::Rectified { image, method } = result else {
            panic!("disc should be detected");
        };
        let RectifyMethod::PaddedCrop(rect) = method else {
            panic!("a disc is not a quadrilateral: {:?}", method);
        };
        assert!(rect.x + rect.width <= w && rect.y + rect.height <= h);
        assert_eq!((image.width(), image.height()), (rect.width, rect.height));
        assert!((255..=290).contains(&rect.width), "width {}", rect.width);
    }

    #[test]
    fn edge_map_marks_sleeve_border() {
        let img = sleeve_on_background(120, 100, 30, 20, 90, 80);
        let edges = SleeveNormalizer::default().edge_map(&img.to_luma8());
        assert_eq!(edges.get_pixel(30, 50).0[0], 255);
        assert_eq!(edges.get_pixel(5, 5).0[0], 0);
        assert_eq!(edges.get_pixel(60, 50).0[0], 0);
    }

    #[test]
    fn inverted_canny_pair_is_rejected_up_front() {
        let config = NormalizerConfig {
            canny_thresholds: vec![(200.0, 50.0)],
            ..NormalizerConfig::default()
        };
        let err = SleeveNormalizer::new(config).unwrap_err();
        assert!(matches!(err, sleevekit_core::SleeveError::InvalidConfig(_)));
    }

    #[test]
    fn validated_config_normalizes_without_panicking() {
        let config = NormalizerConfig {
            canny_thresholds: vec![(50.0, 50.0)],
            ..NormalizerConfig::default()
        };
        let normalizer = SleeveNormalizer::new(config).unwrap();
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 50, Luma([10u8])));
        assert!(!normalizer.normalize(img).is_processed());
    }
}

