// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — warp a document quadrilateral onto an
// axis-aligned rectangle.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument};

use super::geometry::Quad;

/// Solve the homography taking the corners of `quad` to the corners of a
/// `width × height` rectangle.
///
/// Returns `None` if the quad is degenerate (three or more collinear corners)
/// or the rectangle is narrower or shorter than two pixels.
pub fn document_projection(quad: &Quad, width: u32, height: u32) -> Option<Projection> {
    if width < 2 || height < 2 {
        return None;
    }
    let (w, h) = ((width - 1) as f32, (height - 1) as f32);
    let dest = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    Projection::from_control_points(quad.to_array(), dest)
}

/// Rectify the region of `image` bounded by `quad`.
///
/// The output is as wide as the longer of the quad's top and bottom edges and
/// as tall as the longer of its left and right edges. Samples falling outside
/// the source are filled with white.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn four_point_transform(image: &DynamicImage, quad: &Quad) -> Result<DynamicImage> {
    if !quad.is_convex() {
        return Err(ScanwerkError::ImageError(
            "document outline is not a convex quadrilateral".into(),
        ));
    }

    let (out_w, out_h) = quad.output_size();
    if out_w < 2 || out_h < 2 {
        return Err(ScanwerkError::ImageError(format!(
            "document outline too small to rectify ({out_w}x{out_h})"
        )));
    }

    let projection = document_projection(quad, out_w, out_h).ok_or_else(|| {
        ScanwerkError::ImageError("document outline is degenerate; no perspective solution".into())
    })?;
    debug!(out_w, out_h, "perspective solved");

    let source = image.to_rgb8();
    let mut output = RgbImage::new(out_w, out_h);
    warp_into(
        &source,
        &projection,
        Interpolation::Bilinear,
        Rgb([255u8, 255, 255]),
        &mut output,
    );

    info!(out_w, out_h, "perspective correction applied");
    Ok(DynamicImage::ImageRgb8(output))
}
