// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document outline detection — find the largest four-sided contour in a
// photograph, with an optional Hough-line fallback for outlines that do not
// close into a contour.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use imageproc::morphology::dilate;
use imageproc::point::Point;
use scanwerk_core::DetectionConfig;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::geometry::{Quad, distance, order_corners, polygon_area};

/// Radius of the dilation that closes gaps in the edge map. The traced
/// contour runs along the outside of the dilated band, this far beyond the
/// true edge.
const EDGE_DILATION: u8 = 1;

/// Fraction of each side, at either end, left out of the line fit. Points
/// close to an approximate vertex may belong to the neighbouring side.
const SIDE_TRIM: f32 = 0.15;

/// How a document outline was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// Polygon approximation of a traced edge contour.
    Contour,
    /// Intersection of the outermost Hough lines.
    LineFallback,
}

/// A detected document outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    /// Corners in the coordinates of the input image.
    pub quad: Quad,
    /// Fraction of the image covered by the outline.
    pub area_ratio: f32,
    pub strategy: DetectionStrategy,
}

/// Downscaled grayscale edge map the detectors work on.
struct WorkingImage {
    edges: GrayImage,
    /// Original / working size ratios.
    scale_x: f32,
    scale_y: f32,
}

impl WorkingImage {
    fn area(&self) -> f32 {
        self.edges.width() as f32 * self.edges.height() as f32
    }
}

/// Locate the document in `image`.
///
/// Returns `None` when neither the contour search nor (if enabled) the line
/// fallback yields a convex quadrilateral covering at least
/// `config.min_area_ratio` of the frame.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn detect_document(image: &DynamicImage, config: &DetectionConfig) -> Option<Detection> {
    if image.width() < 4 || image.height() < 4 {
        warn!("image too small for document detection");
        return None;
    }

    let working = prepare(image, config);

    if let Some(found) = find_by_contours(&working, config) {
        info!(area_ratio = found.area_ratio, "document outline found from contours");
        return Some(found);
    }

    if config.line_fallback {
        debug!("no quadrilateral contour; trying Hough line fallback");
        if let Some(found) = find_by_lines(&working, config) {
            info!(area_ratio = found.area_ratio, "document outline found from lines");
            return Some(found);
        }
    }

    warn!("no document outline found");
    None
}

/// Downscale, blur, and edge-detect.
fn prepare(image: &DynamicImage, config: &DetectionConfig) -> WorkingImage {
    let (orig_w, orig_h) = (image.width(), image.height());

    let small = if orig_h > config.working_height {
        let ratio = orig_h as f32 / config.working_height as f32;
        let work_w = ((orig_w as f32 / ratio).round() as u32).max(1);
        image.resize_exact(work_w, config.working_height, FilterType::Triangle)
    } else {
        image.clone()
    };

    let gray = small.to_luma8();
    let blurred = gaussian_blur_f32(&gray, config.blur_sigma);
    let edges = canny(&blurred, config.canny_low, config.canny_high);
    // Close single-pixel gaps so the outline traces as one contour.
    let edges = dilate(&edges, Norm::LInf, EDGE_DILATION);

    debug!(
        work_w = edges.width(),
        work_h = edges.height(),
        "edge map prepared"
    );

    WorkingImage {
        scale_x: orig_w as f32 / edges.width() as f32,
        scale_y: orig_h as f32 / edges.height() as f32,
        edges,
    }
}

fn find_by_contours(working: &WorkingImage, config: &DetectionConfig) -> Option<Detection> {
    let min_area = working.area() * config.min_area_ratio;

    let contours = find_contours::<i32>(&working.edges);
    let mut candidates: Vec<(f64, &[Point<i32>])> = contours
        .iter()
        .filter(|c| c.points.len() >= 4)
        .map(|c| (polygon_area(&c.points), c.points.as_slice()))
        .collect();
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    debug!(contours = candidates.len(), "contours traced");

    for (contour_area, points) in candidates.into_iter().take(config.max_candidates) {
        if (contour_area as f32) < min_area {
            // Sorted by area; everything after this is smaller still.
            break;
        }

        let perimeter = arc_length(points, true);
        let epsilon = config.approx_epsilon * perimeter;
        let Some(approx) = approximate_quad(points, epsilon) else {
            continue;
        };
        let corners = refine_corners(points, approx, epsilon as f32).unwrap_or_else(|| {
            debug!("corner refinement failed; keeping polygon vertices");
            approx
        });

        let Some(quad) = order_corners(corners) else {
            continue;
        };
        if !quad.is_convex() {
            debug!(?quad, "rejecting non-convex quadrilateral");
            continue;
        }
        let area = quad.area();
        if area < min_area {
            continue;
        }

        return Some(Detection {
            quad: quad.scale(working.scale_x, working.scale_y),
            area_ratio: area / working.area(),
            strategy: DetectionStrategy::Contour,
        });
    }

    None
}

/// Simplify a closed contour and return its corners if it has exactly four.
fn approximate_quad(points: &[Point<i32>], epsilon: f64) -> Option<[(f32, f32); 4]> {
    // Start the trace at the point farthest from the centroid, which is
    // always a vertex of a convex outline, so the simplification does not
    // keep an arbitrary mid-edge start point.
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y as f64).sum::<f64>() / n;
    let start = points
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            let da = (a.x as f64 - cx).powi(2) + (a.y as f64 - cy).powi(2);
            let db = (b.x as f64 - cx).powi(2) + (b.y as f64 - cy).powi(2);
            da.total_cmp(&db)
        })
        .map(|(i, _)| i)?;

    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[start..]);
    rotated.extend_from_slice(&points[..start]);

    let mut approx = approximate_polygon_dp(&rotated, epsilon, false);

    // The trace ends next to where it started; drop the duplicate vertex.
    if approx.len() > 1 {
        let first = approx[0];
        let last = approx[approx.len() - 1];
        let gap = (((first.x - last.x).pow(2) + (first.y - last.y).pow(2)) as f64).sqrt();
        if gap <= epsilon {
            approx.pop();
        }
    }

    if approx.len() != 4 {
        return None;
    }
    Some([
        (approx[0].x as f32, approx[0].y as f32),
        (approx[1].x as f32, approx[1].y as f32),
        (approx[2].x as f32, approx[2].y as f32),
        (approx[3].x as f32, approx[3].y as f32),
    ])
}

/// Move the vertices of a polygon approximation onto the true corners of
/// the traced outline.
///
/// Douglas–Peucker keeps whichever contour points it happens to split on,
/// which can be a point part-way along a side rather than the corner
/// itself. Each side is instead fitted with a least-squares line through
/// the contour points near its middle, the line is moved inwards by the
/// dilation radius, and adjacent lines are intersected.
///
/// Returns `None` if a side has too few points or a corner moves further
/// than `2 * tolerance`.
fn refine_corners(
    points: &[Point<i32>],
    approx: [(f32, f32); 4],
    tolerance: f32,
) -> Option<[(f32, f32); 4]> {
    let tolerance = tolerance.max(2.0);
    let cx = approx.iter().map(|p| p.0).sum::<f32>() / 4.0;
    let cy = approx.iter().map(|p| p.1).sum::<f32>() / 4.0;

    let mut sides = [(0.0f32, 0.0f32, 0.0f32); 4];
    for (i, side) in sides.iter_mut().enumerate() {
        let (a, b) = (approx[i], approx[(i + 1) % 4]);
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len_sq = dx * dx + dy * dy;
        if len_sq < 1.0 {
            return None;
        }
        let len = len_sq.sqrt();

        let support: Vec<(f32, f32)> = points
            .iter()
            .map(|p| (p.x as f32, p.y as f32))
            .filter(|&(x, y)| {
                let t = ((x - a.0) * dx + (y - a.1) * dy) / len_sq;
                let off = ((x - a.0) * dy - (y - a.1) * dx).abs() / len;
                (SIDE_TRIM..=1.0 - SIDE_TRIM).contains(&t) && off <= tolerance
            })
            .collect();

        let (nx, ny, c) = fit_line(&support)?;
        // Pull the line back from the outside of the dilated band.
        let shift = EDGE_DILATION as f32 * (nx.abs() + ny.abs());
        let c = if nx * cx + ny * cy > c { c + shift } else { c - shift };
        *side = (nx, ny, c);
    }

    let mut corners = approx;
    for (i, corner) in corners.iter_mut().enumerate() {
        let refined = intersect_lines(sides[(i + 3) % 4], sides[i])?;
        if distance(refined, approx[i]) > 2.0 * tolerance {
            return None;
        }
        *corner = refined;
    }
    Some(corners)
}

/// Total least-squares line through `points` as `(nx, ny, c)` with the unit
/// normal `(nx, ny)` and `nx·x + ny·y = c`.
fn fit_line(points: &[(f32, f32)]) -> Option<(f32, f32, f32)> {
    if points.len() < 3 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.0 as f64).sum::<f64>() / n;
    let my = points.iter().map(|p| p.1 as f64).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0f64, 0.0f64, 0.0f64);
    for &(x, y) in points {
        let (dx, dy) = (x as f64 - mx, y as f64 - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let direction = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (nx, ny) = (-direction.sin(), direction.cos());
    Some((nx as f32, ny as f32, (nx * mx + ny * my) as f32))
}

fn intersect_lines(a: (f32, f32, f32), b: (f32, f32, f32)) -> Option<(f32, f32)> {
    let det = a.0 * b.1 - a.1 * b.0;
    if det.abs() < 1e-6 {
        return None;
    }
    Some(((a.2 * b.1 - b.2 * a.1) / det, (a.0 * b.2 - b.0 * a.2) / det))
}

// -- Hough line fallback ------------------------------------------------------

fn find_by_lines(working: &WorkingImage, config: &DetectionConfig) -> Option<Detection> {
    let (w, h) = working.edges.dimensions();

    // Vote threshold scales with the diagonal so detection tracks resolution.
    let diagonal = ((w as f64).powi(2) + (h as f64).powi(2)).sqrt();
    let vote_threshold = (diagonal * 0.25).max(80.0) as u32;
    let options = LineDetectionOptions {
        vote_threshold,
        suppression_radius: 8,
    };
    let lines = detect_lines(&working.edges, options);
    debug!(line_count = lines.len(), vote_threshold, "Hough lines detected");

    let (horizontal, vertical) = classify_lines(&lines);
    if horizontal.len() < 2 || vertical.len() < 2 {
        debug!(
            horizontal = horizontal.len(),
            vertical = vertical.len(),
            "not enough lines for an outline"
        );
        return None;
    }

    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let top = extreme_line(&horizontal, |l| y_at(l, cx), false)?;
    let bottom = extreme_line(&horizontal, |l| y_at(l, cx), true)?;
    let left = extreme_line(&vertical, |l| x_at(l, cy), false)?;
    let right = extreme_line(&vertical, |l| x_at(l, cy), true)?;

    let corners = [
        intersect_polar_lines(&top, &left)?,
        intersect_polar_lines(&top, &right)?,
        intersect_polar_lines(&bottom, &right)?,
        intersect_polar_lines(&bottom, &left)?,
    ];
    let quad = order_corners(corners)?;

    let area = quad.area();
    if !quad.is_convex() || area < working.area() * config.min_area_ratio {
        debug!(area, "line outline rejected");
        return None;
    }

    Some(Detection {
        quad: quad.scale(working.scale_x, working.scale_y),
        area_ratio: area / working.area(),
        strategy: DetectionStrategy::LineFallback,
    })
}

/// Split Hough lines into roughly horizontal and roughly vertical sets.
///
/// A `PolarLine` is `x·cos θ + y·sin θ = r`, so θ near 90° is a horizontal
/// line and θ near 0° or 180° a vertical one. Lines within 30° of either
/// are kept; diagonals are dropped.
fn classify_lines(lines: &[PolarLine]) -> (Vec<PolarLine>, Vec<PolarLine>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for line in lines {
        let angle = line.angle_in_degrees;
        if (60..=120).contains(&angle) {
            horizontal.push(*line);
        } else if angle <= 30 || angle >= 150 {
            vertical.push(*line);
        }
    }

    (horizontal, vertical)
}

/// y of a non-vertical line at column `x`.
fn y_at(line: &PolarLine, x: f32) -> f32 {
    let theta = (line.angle_in_degrees as f32).to_radians();
    (line.r - x * theta.cos()) / theta.sin()
}

/// x of a non-horizontal line at row `y`.
fn x_at(line: &PolarLine, y: f32) -> f32 {
    let theta = (line.angle_in_degrees as f32).to_radians();
    (line.r - y * theta.sin()) / theta.cos()
}

fn extreme_line(
    lines: &[PolarLine],
    position: impl Fn(&PolarLine) -> f32,
    largest: bool,
) -> Option<PolarLine> {
    let cmp = |a: &&PolarLine, b: &&PolarLine| position(a).total_cmp(&position(b));
    if largest {
        lines.iter().max_by(cmp).copied()
    } else {
        lines.iter().min_by(cmp).copied()
    }
}

/// Intersection of two lines in polar (Hough) form, or `None` if they are
/// (nearly) parallel.
fn intersect_polar_lines(a: &PolarLine, b: &PolarLine) -> Option<(f32, f32)> {
    let theta_a = (a.angle_in_degrees as f64).to_radians();
    let theta_b = (b.angle_in_degrees as f64).to_radians();

    let (sin_a, cos_a) = theta_a.sin_cos();
    let (sin_b, cos_b) = theta_b.sin_cos();

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let (r_a, r_b) = (a.r as f64, b.r as f64);
    let x = (r_a * sin_b - r_b * sin_a) / denom;
    let y = (r_b * cos_a - r_a * cos_b) / denom;

    Some((x as f32, y as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_polygon_mut;

    /// Dark background with a filled light polygon.
    fn synthetic(w: u32, h: u32, corners: &[(i32, i32)]) -> DynamicImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([30u8]));
        let poly: Vec<Point<i32>> = corners.iter().map(|&(x, y)| Point::new(x, y)).collect();
        draw_polygon_mut(&mut img, &poly, Luma([235u8]));
        DynamicImage::ImageLuma8(img)
    }

    fn near(a: (f32, f32), b: (f32, f32), tol: f32) -> bool {
        (a.0 - b.0).abs() <= tol && (a.1 - b.1).abs() <= tol
    }

    #[test]
    fn finds_axis_aligned_page() {
        let img = synthetic(400, 500, &[(60, 50), (340, 50), (340, 450), (60, 450)]);
        let found = detect_document(&img, &DetectionConfig::default()).expect("page");

        assert_eq!(found.strategy, DetectionStrategy::Contour);
        let q = found.quad;
        assert!(near(q.top_left, (60.0, 50.0), 5.0), "{q:?}");
        assert!(near(q.top_right, (340.0, 50.0), 5.0), "{q:?}");
        assert!(near(q.bottom_right, (340.0, 450.0), 5.0), "{q:?}");
        assert!(near(q.bottom_left, (60.0, 450.0), 5.0), "{q:?}");
        assert!(found.area_ratio > 0.5 && found.area_ratio < 0.65);
    }

    #[test]
    fn finds_tilted_page_and_orders_corners() {
        let img = synthetic(480, 480, &[(120, 40), (420, 110), (360, 440), (50, 380)]);
        let found = detect_document(&img, &DetectionConfig::default()).expect("page");

        let q = found.quad;
        assert!(near(q.top_left, (120.0, 40.0), 6.0), "{q:?}");
        assert!(near(q.top_right, (420.0, 110.0), 6.0), "{q:?}");
        assert!(near(q.bottom_right, (360.0, 440.0), 6.0), "{q:?}");
        assert!(near(q.bottom_left, (50.0, 380.0), 6.0), "{q:?}");
    }

    #[test]
    fn corners_come_from_the_outline_not_the_simplified_polygon() {
        // At the default tolerance the polygon simplification keeps a point
        // part-way along the bottom edge instead of the bottom-right corner.
        let img = synthetic(600, 800, &[(100, 80), (520, 110), (500, 720), (80, 700)]);
        let found = detect_document(&img, &DetectionConfig::default()).expect("page");

        let q = found.quad;
        assert!(near(q.top_left, (100.0, 80.0), 3.0), "{q:?}");
        assert!(near(q.top_right, (520.0, 110.0), 3.0), "{q:?}");
        assert!(near(q.bottom_right, (500.0, 720.0), 3.0), "{q:?}");
        assert!(near(q.bottom_left, (80.0, 700.0), 3.0), "{q:?}");
    }

    #[test]
    fn fit_line_through_collinear_points() {
        let pts: Vec<(f32, f32)> = (0..20).map(|i| (i as f32, 2.0 * i as f32 + 1.0)).collect();
        let (nx, ny, c) = fit_line(&pts).unwrap();
        for &(x, y) in &pts {
            assert!((nx * x + ny * y - c).abs() < 1e-3);
        }
        assert!(fit_line(&pts[..2]).is_none());
    }

    #[test]
    fn intersect_lines_meets_at_corner() {
        // x = 5 and y = 7.
        let pt = intersect_lines((1.0, 0.0, 5.0), (0.0, 1.0, 7.0)).unwrap();
        assert!(near(pt, (5.0, 7.0), 1e-4));
        assert!(intersect_lines((1.0, 0.0, 5.0), (1.0, 0.0, 9.0)).is_none());
    }

    #[test]
    fn corners_are_scaled_back_from_working_copy() {
        // 2x the working height: detection runs on a half-size copy.
        let img = synthetic(800, 1000, &[(120, 100), (680, 100), (680, 900), (120, 900)]);
        let found = detect_document(&img, &DetectionConfig::default()).expect("page");

        let q = found.quad;
        assert!(near(q.top_left, (120.0, 100.0), 10.0), "{q:?}");
        assert!(near(q.bottom_right, (680.0, 900.0), 10.0), "{q:?}");
    }

    #[test]
    fn uniform_image_has_no_document() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 400, Rgb([200, 200, 200])));
        assert!(detect_document(&img, &DetectionConfig::default()).is_none());
    }

    #[test]
    fn small_outline_is_rejected_by_area_threshold() {
        let img = synthetic(400, 500, &[(180, 230), (220, 230), (220, 270), (180, 270)]);
        assert!(detect_document(&img, &DetectionConfig::default()).is_none());

        let permissive = DetectionConfig {
            min_area_ratio: 0.0,
            ..DetectionConfig::default()
        };
        assert!(detect_document(&img, &permissive).is_some());
    }

    #[test]
    fn triangle_is_not_a_document() {
        let img = synthetic(400, 500, &[(200, 40), (370, 460), (30, 460)]);
        let config = DetectionConfig {
            line_fallback: false,
            ..DetectionConfig::default()
        };
        assert!(detect_document(&img, &config).is_none());
    }

    #[test]
    fn tiny_image_returns_none() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(3, 3));
        assert!(detect_document(&img, &DetectionConfig::default()).is_none());
    }

    #[test]
    fn classify_lines_by_orientation() {
        let lines = vec![
            PolarLine { r: 10.0, angle_in_degrees: 90 },  // horizontal
            PolarLine { r: 20.0, angle_in_degrees: 85 },  // horizontal
            PolarLine { r: 30.0, angle_in_degrees: 0 },   // vertical
            PolarLine { r: 40.0, angle_in_degrees: 5 },   // vertical
            PolarLine { r: 50.0, angle_in_degrees: 45 },  // diagonal, dropped
            PolarLine { r: -60.0, angle_in_degrees: 175 }, // vertical
        ];

        let (horiz, vert) = classify_lines(&lines);
        assert_eq!(horiz.len(), 2);
        assert_eq!(vert.len(), 3);
    }

    #[test]
    fn intersect_polar_lines_perpendicular() {
        let h = PolarLine { r: 100.0, angle_in_degrees: 90 };
        let v = PolarLine { r: 50.0, angle_in_degrees: 0 };

        let pt = intersect_polar_lines(&h, &v).expect("should intersect");
        assert!(near(pt, (50.0, 100.0), 0.5), "got {pt:?}");
    }

    #[test]
    fn intersect_polar_lines_parallel_returns_none() {
        let a = PolarLine { r: 50.0, angle_in_degrees: 0 };
        let b = PolarLine { r: 100.0, angle_in_degrees: 0 };
        assert!(intersect_polar_lines(&a, &b).is_none());
    }

    #[test]
    fn line_position_handles_obtuse_angles() {
        // θ = 180°: x·(-1) = r, so r = -70 is the vertical line x = 70.
        let line = PolarLine { r: -70.0, angle_in_degrees: 180 };
        assert!((x_at(&line, 25.0) - 70.0).abs() < 1e-3);

        let horizontal = PolarLine { r: 40.0, angle_in_degrees: 90 };
        assert!((y_at(&horizontal, 123.0) - 40.0).abs() < 1e-3);
    }

    #[test]
    fn line_detector_finds_outline_from_crossing_strokes() {
        // Four long strokes that cross past each other like a `#`.
        let mut img = GrayImage::from_pixel(400, 500, Luma([20u8]));
        for x in 20..380 {
            for t in 0..3 {
                img.put_pixel(x, 60 + t, Luma([240u8]));
                img.put_pixel(x, 440 + t, Luma([240u8]));
            }
        }
        for y in 20..480 {
            for t in 0..3 {
                img.put_pixel(60 + t, y, Luma([240u8]));
                img.put_pixel(340 + t, y, Luma([240u8]));
            }
        }
        let img = DynamicImage::ImageLuma8(img);

        let config = DetectionConfig {
            line_fallback: true,
            ..DetectionConfig::default()
        };
        let working = prepare(&img, &config);
        let found = find_by_lines(&working, &config).expect("outline from lines");

        assert_eq!(found.strategy, DetectionStrategy::LineFallback);
        let (w, h) = found.quad.output_size();
        assert!(w > 250 && w < 310, "width {w}");
        assert!(h > 350 && h < 410, "height {h}");
    }

    #[test]
    fn line_detector_needs_two_lines_each_way() {
        let config = DetectionConfig::default();
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 300, Luma([128u8])));
        let working = prepare(&img, &config);
        assert!(find_by_lines(&working, &config).is_none());
    }
}
