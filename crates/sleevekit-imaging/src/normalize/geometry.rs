// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral geometry: corner ordering, rectified output size, and the
// perspective warp that flattens a photographed sleeve.

use image::{DynamicImage, ImageBuffer, Pixel};
use imageproc::definitions::Clamp;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use serde::Serialize;
use tracing::debug;

/// A 2-D point in image coordinates, `(x, y)`.
pub type Point2 = (f32, f32);

/// Four candidate corners of a detected quadrilateral, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointQuad(pub [Point2; 4]);

impl PointQuad {
    pub fn new(points: [Point2; 4]) -> Self {
        Self(points)
    }

    /// Assign the four points to fixed corner roles.
    ///
    /// The point with the smallest `x + y` is top-left and the largest is
    /// bottom-right; the smallest `y - x` is top-right and the largest is
    /// bottom-left. This holds for convex, roughly axis-aligned shapes such as
    /// a photographed sleeve. Quads rotated by more than about 45 degrees get
    /// their corners misassigned.
    pub fn order(&self) -> OrderedQuad {
        let pts = &self.0;
        OrderedQuad {
            top_left: extreme(pts, |p| p.0 + p.1, Extreme::Min),
            top_right: extreme(pts, |p| p.1 - p.0, Extreme::Min),
            bottom_right: extreme(pts, |p| p.0 + p.1, Extreme::Max),
            bottom_left: extreme(pts, |p| p.1 - p.0, Extreme::Max),
        }
    }
}

/// Four corners with fixed roles. Only obtainable through [`PointQuad::order`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderedQuad {
    top_left: Point2,
    top_right: Point2,
    bottom_right: Point2,
    bottom_left: Point2,
}

impl OrderedQuad {
    pub fn top_left(&self) -> Point2 {
        self.top_left
    }

    pub fn top_right(&self) -> Point2 {
        self.top_right
    }

    pub fn bottom_right(&self) -> Point2 {
        self.bottom_right
    }

    pub fn bottom_left(&self) -> Point2 {
        self.bottom_left
    }

    /// Corners as `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn corners(&self) -> [Point2; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Size of the rectified output: the longer of each pair of opposite
    /// edges, truncated to whole pixels. `None` if either side is zero.
    pub fn output_size(&self) -> Option<(u32, u32)> {
        let width = distance(self.bottom_right, self.bottom_left)
            .floor()
            .max(distance(self.top_right, self.top_left).floor());
        let height = distance(self.top_right, self.bottom_right)
            .floor()
            .max(distance(self.top_left, self.bottom_left).floor());

        if width < 1.0 || height < 1.0 {
            return None;
        }
        Some((width as u32, height as u32))
    }
}

#[derive(Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

/// The first point whose key is smallest (or largest).
fn extreme(points: &[Point2; 4], key: impl Fn(&Point2) -> f32, which: Extreme) -> Point2 {
    let mut best = points[0];
    let mut best_key = key(&best);
    for point in &points[1..] {
        let k = key(point);
        let better = match which {
            Extreme::Min => k < best_key,
            Extreme::Max => k > best_key,
        };
        if better {
            best = *point;
            best_key = k;
        }
    }
    best
}

fn distance(a: Point2, b: Point2) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Warp the region bounded by `quad` into an axis-aligned rectangle.
///
/// The destination corners are `(0,0)`, `(W-1,0)`, `(W-1,H-1)`, `(0,H-1)`
/// where `W`x`H` is [`OrderedQuad::output_size`]. 8- and 16-bit images keep
/// their pixel format; float images come back as 8-bit RGB or RGBA. Uncovered
/// output pixels are zero. Returns `None` when the size is degenerate or no
/// projective transform maps the corners.
pub fn rectify(image: &DynamicImage, quad: &OrderedQuad) -> Option<DynamicImage> {
    let (out_w, out_h) = quad.output_size()?;
    let right = (out_w - 1) as f32;
    let bottom = (out_h - 1) as f32;
    let dest: [Point2; 4] = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];

    // Maps source corners onto the destination rectangle.
    let projection = Projection::from_control_points(quad.corners(), dest)?;
    debug!(out_w, out_h, "Projective transform computed");

    let (w, h) = (out_w, out_h);
    let warped = match image {
        DynamicImage::ImageLuma8(src) => DynamicImage::ImageLuma8(warp(src, &projection, w, h)),
        DynamicImage::ImageLumaA8(src) => DynamicImage::ImageLumaA8(warp(src, &projection, w, h)),
        DynamicImage::ImageRgb8(src) => DynamicImage::ImageRgb8(warp(src, &projection, w, h)),
        DynamicImage::ImageRgba8(src) => DynamicImage::ImageRgba8(warp(src, &projection, w, h)),
        DynamicImage::ImageLuma16(src) => DynamicImage::ImageLuma16(warp(src, &projection, w, h)),
        DynamicImage::ImageLumaA16(src) => DynamicImage::ImageLumaA16(warp(src, &projection, w, h)),
        DynamicImage::ImageRgb16(src) => DynamicImage::ImageRgb16(warp(src, &projection, w, h)),
        DynamicImage::ImageRgba16(src) => DynamicImage::ImageRgba16(warp(src, &projection, w, h)),
        other if other.color().has_alpha() => {
            DynamicImage::ImageRgba8(warp(&other.to_rgba8(), &projection, w, h))
        }
        other => DynamicImage::ImageRgb8(warp(&other.to_rgb8(), &projection, w, h)),
    };
    Some(warped)
}

fn warp<P>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    projection: &Projection,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + Send + Sync,
    P::Subpixel: Send + Sync + Into<f32> + Clamp<f32>,
{
    let mut out = ImageBuffer::new(width, height);
    // A freshly allocated buffer is all zeros: black, and transparent where
    // there is alpha.
    let blank = *out.get_pixel(0, 0);
    warp_into(src, projection, Interpolation::Bilinear, blank, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn permutations(points: [Point2; 4]) -> Vec<[Point2; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut seen = [false; 4];
                        idx.iter().for_each(|&i| seen[i] = true);
                        if seen.iter().all(|&s| s) {
                            out.push([points[a], points[b], points[c], points[d]]);
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn ordering_ignores_input_order() {
        let tl = (12.0, 8.0);
        let tr = (205.0, 15.0);
        let br = (198.0, 290.0);
        let bl = (5.0, 280.0);

        let perms = permutations([tl, tr, br, bl]);
        assert_eq!(perms.len(), 24);
        for perm in perms {
            let quad = PointQuad::new(perm).order();
            assert_eq!(quad.corners(), [tl, tr, br, bl], "input {:?}", perm);
        }
    }

    #[test]
    fn min_sum_is_top_left_and_max_sum_is_bottom_right() {
        let quad = PointQuad::new([(300.0, 410.0), (40.0, 395.0), (290.0, 30.0), (55.0, 20.0)]).order();
        assert_eq!(quad.top_left(), (55.0, 20.0));
        assert_eq!(quad.bottom_right(), (300.0, 410.0));
        assert_eq!(quad.top_right(), (290.0, 30.0));
        assert_eq!(quad.bottom_left(), (40.0, 395.0));
    }

    #[test]
    fn output_size_uses_longer_opposite_edges() {
        // Top edge 100, bottom edge ~120.4; left edge 50, right edge ~63.2.
        let quad = PointQuad::new([(0.0, 0.0), (100.0, 0.0), (120.0, 60.0), (0.0, 50.0)]).order();
        assert_eq!(quad.output_size(), Some((120, 63)));
    }

    #[test]
    fn collapsed_quad_has_no_output_size() {
        let quad = PointQuad::new([(5.0, 5.0); 4]).order();
        assert!(quad.output_size().is_none());
        let img = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        assert!(rectify(&img, &quad).is_none());
    }

    #[test]
    fn rectifying_axis_aligned_image_keeps_its_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(120, 80, |x, y| {
            Rgb([(x * 2) as u8, (y * 3) as u8, 90])
        }));
        let quad = PointQuad::new([(119.0, 79.0), (0.0, 0.0), (0.0, 79.0), (119.0, 0.0)]).order();

        let out = rectify(&img, &quad).unwrap();
        assert!(out.width().abs_diff(120) <= 1, "width {}", out.width());
        assert!(out.height().abs_diff(80) <= 1, "height {}", out.height());
    }

    #[test]
    fn rectify_preserves_alpha_channel() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 30, Rgba([1, 2, 3, 200])));
        let quad = PointQuad::new([(0.0, 0.0), (39.0, 0.0), (39.0, 29.0), (0.0, 29.0)]).order();
        let out = rectify(&img, &quad).unwrap();
        assert!(out.color().has_alpha());
    }

    #[test]
    fn rectify_keeps_grayscale_and_depth() {
        let quad = PointQuad::new([(2.0, 3.0), (30.0, 3.0), (30.0, 20.0), (2.0, 20.0)]).order();

        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 30, Luma([120])));
        let out = rectify(&gray, &quad).unwrap();
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
        assert_eq!(out.as_luma8().unwrap().get_pixel(5, 5).0[0], 120);

        let deep = DynamicImage::ImageRgb16(image::ImageBuffer::from_pixel(40, 30, Rgb([1000u16, 20000, 65535])));
        assert!(matches!(rectify(&deep, &quad).unwrap(), DynamicImage::ImageRgb16(_)));
    }
}
