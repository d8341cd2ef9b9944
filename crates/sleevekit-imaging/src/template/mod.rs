// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Template scanning: locate a known sleeve inside composite images (collages,
// shelf photos) and mark where it was found.

pub mod ncc;
pub mod scanner;

use image::{DynamicImage, Rgb, Rgba};
use imageproc::drawing::{Canvas, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use sleevekit_core::MatchBox;

pub use ncc::{CorrelationPeak, best_match};
pub use scanner::{FileMatch, FileOutcome, ScanReport, scan, scan_directory, scan_directory_with};

/// Copy `image` with a hollow rectangle of `color` drawn around `match_box`.
///
/// The outline grows outwards by one pixel per unit of `thickness`; anything
/// falling outside the image is clipped.
pub fn annotate(image: &DynamicImage, match_box: &MatchBox, color: [u8; 3], thickness: u32) -> DynamicImage {
    let [r, g, b] = color;
    if image.color().has_alpha() {
        let mut canvas = image.to_rgba8();
        draw_outline(&mut canvas, match_box, Rgba([r, g, b, 255]), thickness);
        DynamicImage::ImageRgba8(canvas)
    } else {
        let mut canvas = image.to_rgb8();
        draw_outline(&mut canvas, match_box, Rgb([r, g, b]), thickness);
        DynamicImage::ImageRgb8(canvas)
    }
}

fn draw_outline<C: Canvas>(canvas: &mut C, match_box: &MatchBox, color: C::Pixel, thickness: u32) {
    for i in 0..thickness.max(1) {
        let rect = Rect::at(match_box.x as i32 - i as i32, match_box.y as i32 - i as i32)
            .of_size(match_box.width.max(1) + 2 * i, match_box.height.max(1) + 2 * i);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
