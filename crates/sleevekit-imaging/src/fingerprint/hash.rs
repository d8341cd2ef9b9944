// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perceptual hashes: difference hash and average hash over an 8x8 grid.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use sleevekit_core::{FingerprintPair, ImageHash};

/// Side of the hash grid; each hash has `HASH_SIZE * HASH_SIZE` bits.
pub const HASH_SIZE: u32 = 8;

/// Compute both perceptual hashes of `image`.
///
/// Identical pixels always produce identical fingerprints. An image with no
/// pixels hashes to all zeros.
pub fn fingerprint(image: &DynamicImage) -> FingerprintPair {
    let gray = image.to_luma8();
    FingerprintPair::new(difference_hash(&gray), average_hash(&gray))
}

/// Difference hash: shrink to 9x8 and set a bit wherever a pixel is brighter
/// than its left-hand neighbour.
pub fn difference_hash(gray: &GrayImage) -> ImageHash {
    let Some(small) = shrink(gray, HASH_SIZE + 1, HASH_SIZE) else {
        return ImageHash::new(0);
    };
    let small = &small;
    ImageHash::from_bits((0..HASH_SIZE).flat_map(|y| {
        (0..HASH_SIZE).map(move |x| small.get_pixel(x + 1, y).0[0] > small.get_pixel(x, y).0[0])
    }))
}

/// Average hash: shrink to 8x8 and set a bit wherever a cell is brighter than
/// the mean of all cells.
pub fn average_hash(gray: &GrayImage) -> ImageHash {
    let Some(small) = shrink(gray, HASH_SIZE, HASH_SIZE) else {
        return ImageHash::new(0);
    };
    let cells: Vec<u8> = small.pixels().map(|p| p.0[0]).collect();
    let mean = cells.iter().map(|&v| v as f64).sum::<f64>() / cells.len() as f64;
    ImageHash::from_bits(cells.iter().map(|&v| v as f64 > mean))
}

fn shrink(gray: &GrayImage, width: u32, height: u32) -> Option<GrayImage> {
    if gray.width() == 0 || gray.height() == 0 {
        return None;
    }
    Some(imageops::resize(gray, width, height, FilterType::Lanczos3))
}
