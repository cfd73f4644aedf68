// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral geometry for document outlines — corner ordering, output
// dimensions, area and convexity.

use imageproc::point::Point;
use serde::Serialize;

/// A 2D point in image pixel coordinates.
pub type Corner = (f32, f32);

/// A document outline with its corners in reading order.
///
/// Corners are always stored as top-left, top-right, bottom-right,
/// bottom-left, which is the order the rectifier maps onto the output
/// rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quad {
    pub top_left: Corner,
    pub top_right: Corner,
    pub bottom_right: Corner,
    pub bottom_left: Corner,
}

impl Quad {
    /// Corners as `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn to_array(&self) -> [Corner; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Size of the rectified output, in whole pixels.
    ///
    /// Width is the longer of the top and bottom edges, height the longer of
    /// the left and right edges. Fractions are truncated; each side is at
    /// least one pixel.
    pub fn output_size(&self) -> (u32, u32) {
        let width_bottom = distance(self.bottom_right, self.bottom_left);
        let width_top = distance(self.top_right, self.top_left);
        let height_right = distance(self.top_right, self.bottom_right);
        let height_left = distance(self.top_left, self.bottom_left);

        let width = width_bottom.max(width_top) as u32;
        let height = height_right.max(height_left) as u32;
        (width.max(1), height.max(1))
    }

    /// Enclosed area (shoelace formula).
    pub fn area(&self) -> f32 {
        shoelace_area(&self.to_array())
    }

    /// Multiply x coordinates by `fx` and y coordinates by `fy`.
    pub fn scale(&self, fx: f32, fy: f32) -> Self {
        let s = |(x, y): Corner| (x * fx, y * fy);
        Self {
            top_left: s(self.top_left),
            top_right: s(self.top_right),
            bottom_right: s(self.bottom_right),
            bottom_left: s(self.bottom_left),
        }
    }

    /// True when every turn around the outline has the same sign.
    pub fn is_convex(&self) -> bool {
        let pts = self.to_array();
        let mut sign = 0.0f32;
        for i in 0..4 {
            let a = pts[i];
            let b = pts[(i + 1) % 4];
            let c = pts[(i + 2) % 4];
            let cross = (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0);
            if cross.abs() < f32::EPSILON {
                return false;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}

/// Order four unordered points into a [`Quad`].
///
/// Uses the sum/difference heuristic: the top-left corner has the smallest
/// `x + y`, bottom-right the largest; top-right has the smallest `y - x`,
/// bottom-left the largest. When the heuristic assigns one point to two
/// corners (a square rotated by 45°, for instance), the points are ordered
/// clockwise by angle around their centroid instead, starting from the one
/// with the smallest `x + y`.
///
/// Returns `None` if the points are not four distinct locations.
pub fn order_corners(points: [Corner; 4]) -> Option<Quad> {
    for i in 0..4 {
        for j in (i + 1)..4 {
            if points[i] == points[j] {
                return None;
            }
        }
    }

    let sum = |p: &Corner| p.0 + p.1;
    let diff = |p: &Corner| p.1 - p.0;

    let tl = index_by(&points, sum, false);
    let br = index_by(&points, sum, true);
    let tr = index_by(&points, diff, false);
    let bl = index_by(&points, diff, true);

    let mut seen = [false; 4];
    for idx in [tl, tr, br, bl] {
        seen[idx] = true;
    }
    if seen.iter().all(|&s| s) {
        return Some(Quad {
            top_left: points[tl],
            top_right: points[tr],
            bottom_right: points[br],
            bottom_left: points[bl],
        });
    }

    Some(order_by_angle(points))
}

/// Index of the point with the smallest (or largest) `key`; ties keep the
/// first occurrence.
fn index_by(points: &[Corner; 4], key: impl Fn(&Corner) -> f32, largest: bool) -> usize {
    let mut best = 0;
    for i in 1..4 {
        let better = if largest {
            key(&points[i]) > key(&points[best])
        } else {
            key(&points[i]) < key(&points[best])
        };
        if better {
            best = i;
        }
    }
    best
}

fn order_by_angle(points: [Corner; 4]) -> Quad {
    let cx = points.iter().map(|p| p.0).sum::<f32>() / 4.0;
    let cy = points.iter().map(|p| p.1).sum::<f32>() / 4.0;

    // Image y grows downwards, so increasing atan2 runs clockwise on screen.
    let mut sorted = points;
    sorted.sort_by(|a, b| {
        let angle_a = (a.1 - cy).atan2(a.0 - cx);
        let angle_b = (b.1 - cy).atan2(b.0 - cx);
        angle_a.total_cmp(&angle_b)
    });

    let start = index_by(&sorted, |p| p.0 + p.1, false);
    sorted.rotate_left(start);

    Quad {
        top_left: sorted[0],
        top_right: sorted[1],
        bottom_right: sorted[2],
        bottom_left: sorted[3],
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Corner, b: Corner) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Area of a polygon given by ordered vertices (CW or CCW).
pub fn shoelace_area(corners: &[Corner]) -> f32 {
    let n = corners.len();
    let mut area = 0.0f32;
    for i in 0..n {
        let j = (i + 1) % n;
        area += corners[i].0 * corners[j].1;
        area -= corners[j].0 * corners[i].1;
    }
    area.abs() / 2.0
}

/// Area enclosed by a traced contour.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}
