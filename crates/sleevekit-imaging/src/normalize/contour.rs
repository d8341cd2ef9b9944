// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour helpers: external contour extraction from an edge map and the
// polygon measurements used to judge and simplify it.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;
use serde::Serialize;

/// An axis-aligned pixel rectangle. `width`/`height` count pixels, so a
/// single pixel has size 1x1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Return the outermost contour enclosing the largest area, with that area.
///
/// Only top-level outer borders count; holes and borders nested inside them
/// are ignored.
pub fn largest_external_contour(edges: &GrayImage) -> Option<(Vec<Point<i32>>, f64)> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let area = polygon_area(&c.points);
            (c.points, area)
        })
        .fold(None, |best, (points, area)| match best {
            Some((_, best_area)) if best_area >= area => best,
            _ => Some((points, area)),
        })
}

/// Area enclosed by a closed polygon, by the shoelace formula.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x as f64 * points[j].y as f64;
        area -= points[j].x as f64 * points[i].y as f64;
    }
    area.abs() / 2.0
}

/// Length of a closed polygon's boundary.
pub fn perimeter(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| point_distance(points[i], points[(i + 1) % n]))
        .sum()
}

/// Simplify a closed curve with the Douglas-Peucker algorithm.
///
/// The curve is split at its first point and the point farthest from it; each
/// half is then simplified so that no dropped point lies farther than
/// `epsilon` from the kept polyline. The result lists each kept vertex once.
pub fn approximate_closed_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let far = (1..n)
        .max_by(|&a, &b| {
            point_distance(points[0], points[a]).total_cmp(&point_distance(points[0], points[b]))
        })
        .unwrap_or(0);
    if far == 0 {
        return vec![points[0]];
    }

    // Index n wraps back to the first point.
    let at = |i: usize| points[i % n];
    let mut keep = vec![false; n + 1];
    keep[0] = true;
    keep[far] = true;
    keep[n] = true;

    let mut stack = vec![(0usize, far), (far, n)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (index, max_dist) = ((start + 1)..end)
            .map(|i| (i, segment_distance(at(i), at(start), at(end))))
            .fold((start, -1.0f64), |best, cur| if cur.1 > best.1 { cur } else { best });
        if max_dist > epsilon {
            keep[index] = true;
            stack.push((start, index));
            stack.push((index, end));
        }
    }

    (0..n).filter(|&i| keep[i]).map(|i| points[i]).collect()
}

/// Smallest pixel rectangle containing every point.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<PixelRect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let min_x = min_x.max(0) as u32;
    let min_y = min_y.max(0) as u32;
    Some(PixelRect {
        x: min_x,
        y: min_y,
        width: (max_x.max(0) as u32 + 1).saturating_sub(min_x),
        height: (max_y.max(0) as u32 + 1).saturating_sub(min_y),
    })
}

/// Grow `rect` by `padding` on every side, clamped to a `width`x`height`
/// image. The result never extends past the image.
pub fn padded_rect(rect: PixelRect, padding: u32, width: u32, height: u32) -> PixelRect {
    let x = rect.x.saturating_sub(padding).min(width);
    let y = rect.y.saturating_sub(padding).min(height);
    let grown_w = rect.width.saturating_add(padding.saturating_mul(2));
    let grown_h = rect.height.saturating_add(padding.saturating_mul(2));
    PixelRect {
        x,
        y,
        width: grown_w.min(width - x),
        height: grown_h.min(height - y),
    }
}

fn point_distance(a: Point<i32>, b: Point<i32>) -> f64 {
    ((a.x - b.x) as f64).hypot((a.y - b.y) as f64)
}

/// Distance from `p` to the line through `a` and `b` (or to `a` if they
/// coincide).
fn segment_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return point_distance(p, a);
    }
    ((p.x - a.x) as f64 * dy - (p.y - a.y) as f64 * dx).abs() / len
}
