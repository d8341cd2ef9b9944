// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Normalized cross-correlation: exhaustive sliding-window search for the
// offset where a template best matches an image.

use image::RgbImage;
use rayon::prelude::*;

const CHANNELS: usize = 3;

/// Best-scoring template offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPeak {
    pub x: u32,
    pub y: u32,
    /// Zero-mean normalized correlation in [-1, 1].
    pub score: f32,
}

/// Find the offset of `template` inside `image` with the highest correlation
/// coefficient.
///
/// Every colour channel of the template and of each window is
/// mean-subtracted on its own, and the cross and norm terms are summed over
/// all three channels, so a recoloured copy of a pattern does not match it
/// while a uniform brightness shift does. Windows with no variance score 0.
/// Returns `None` if the template is empty, larger than the image, or has no
/// variance itself. Ties go to the first offset in row-major order.
pub fn best_match(image: &RgbImage, template: &RgbImage) -> Option<CorrelationPeak> {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return None;
    }

    let n = (tw * th) as u64;
    let mut t_sum = [0u64; CHANNELS];
    for p in template.pixels() {
        for c in 0..CHANNELS {
            t_sum[c] += p.0[c] as u64;
        }
    }
    let t_mean = t_sum.map(|s| s as f32 / n as f32);
    // Interleaved like the image rows, so a window row zips against it directly.
    let t_dev: Vec<f32> = template
        .pixels()
        .flat_map(|p| (0..CHANNELS).map(move |c| p.0[c] as f32 - t_mean[c]))
        .collect();
    let t_norm: f64 = t_dev.iter().map(|&d| d as f64 * d as f64).sum();
    if t_norm <= f64::EPSILON {
        return None;
    }

    let stats = WindowStats::new(image);
    let pixels: Vec<f32> = image.as_raw().iter().map(|&v| v as f32).collect();
    let (iw, tw, th) = (iw as usize, tw as usize, th as usize);
    let out_w = iw - tw + 1;
    let out_h = ih as usize - th + 1;
    let row_len = tw * CHANNELS;

    (0..out_h)
        .into_par_iter()
        .map(|y| {
            let mut row_best = CorrelationPeak { x: 0, y: y as u32, score: f32::NEG_INFINITY };
            for x in 0..out_w {
                let spread = stats.spread(x, y, tw, th);
                let score = if spread == 0 {
                    0.0
                } else {
                    let cross: f64 = (0..th)
                        .map(|ty| {
                            let start = ((y + ty) * iw + x) * CHANNELS;
                            let window = &pixels[start..start + row_len];
                            let trow = &t_dev[ty * row_len..(ty + 1) * row_len];
                            window.iter().zip(trow).map(|(a, b)| a * b).sum::<f32>() as f64
                        })
                        .sum();
                    let denom = (t_norm * spread as f64 / n as f64).sqrt();
                    (cross / denom).clamp(-1.0, 1.0) as f32
                };
                if score > row_best.score {
                    row_best = CorrelationPeak { x: x as u32, y: y as u32, score };
                }
            }
            row_best
        })
        .reduce_with(|a, b| {
            if b.score > a.score || (b.score == a.score && (b.y, b.x) < (a.y, a.x)) {
                b
            } else {
                a
            }
        })
}

/// Per-channel summed-area tables of pixel values and their squares.
///
/// Entry `[y * (width+1) + x]` of a channel's table holds the sum over the
/// rectangle `[0, x) x [0, y)`; the tables carry a zero-padded first row and
/// column.
struct WindowStats {
    sum: [Vec<u64>; CHANNELS],
    sum_sq: [Vec<u64>; CHANNELS],
    stride: usize,
}

impl WindowStats {
    fn new(image: &RgbImage) -> Self {
        let (w, h) = image.dimensions();
        let stride = (w + 1) as usize;
        let len = stride * (h + 1) as usize;
        let mut sum: [Vec<u64>; CHANNELS] = std::array::from_fn(|_| vec![0u64; len]);
        let mut sum_sq: [Vec<u64>; CHANNELS] = std::array::from_fn(|_| vec![0u64; len]);

        for c in 0..CHANNELS {
            for y in 0..h {
                let mut row_sum: u64 = 0;
                let mut row_sq: u64 = 0;
                for x in 0..w {
                    let v = image.get_pixel(x, y).0[c] as u64;
                    row_sum += v;
                    row_sq += v * v;
                    let idx = (y + 1) as usize * stride + (x + 1) as usize;
                    let above = y as usize * stride + (x + 1) as usize;
                    sum[c][idx] = row_sum + sum[c][above];
                    sum_sq[c][idx] = row_sq + sum_sq[c][above];
                }
            }
        }

        Self { sum, sum_sq, stride }
    }

    fn region(table: &[u64], stride: usize, x: usize, y: usize, w: usize, h: usize) -> u64 {
        let (x2, y2) = (x + w, y + h);
        table[y2 * stride + x2] + table[y * stride + x] - table[y * stride + x2] - table[y2 * stride + x]
    }

    /// `n * Σv² - (Σv)²` for each channel of a window of `n` pixels, summed
    /// over the channels and computed exactly; this is `n` times the window's
    /// total sum of squared deviations from the per-channel means. Zero
    /// means the window is flat.
    fn spread(&self, x: usize, y: usize, w: usize, h: usize) -> u128 {
        let n = (w * h) as u128;
        (0..CHANNELS)
            .map(|c| {
                let s = Self::region(&self.sum[c], self.stride, x, y, w, h) as u128;
                let sq = Self::region(&self.sum_sq[c], self.stride, x, y, w, h) as u128;
                (n * sq).saturating_sub(s * s)
            })
            .sum()
    }
}
