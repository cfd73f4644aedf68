// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the auto-crop pipeline: document detection and
// perspective rectification on a synthetic photographed page.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use scanwerk_core::DetectionConfig;
use scanwerk_document::{detect_document, four_point_transform};

/// A 1200x1600 "photo": a tilted light page on a dark table.
fn photographed_page() -> DynamicImage {
    let mut img = GrayImage::from_pixel(1200, 1600, Luma([40u8]));
    let outline = [
        Point::new(220, 180),
        Point::new(1010, 240),
        Point::new(960, 1420),
        Point::new(170, 1380),
    ];
    draw_polygon_mut(&mut img, &outline, Luma([230u8]));
    DynamicImage::ImageLuma8(img)
}

fn bench_detection(c: &mut Criterion) {
    let photo = photographed_page();
    let config = DetectionConfig::default();

    c.bench_function("detect_document (1200x1600)", |b| {
        b.iter(|| black_box(detect_document(black_box(&photo), &config)));
    });
}

fn bench_rectification(c: &mut Criterion) {
    let photo = photographed_page();
    let Some(detection) = detect_document(&photo, &DetectionConfig::default()) else {
        return;
    };

    c.bench_function("four_point_transform (1200x1600)", |b| {
        b.iter(|| black_box(four_point_transform(black_box(&photo), &detection.quad)));
    });
}

criterion_group!(benches, bench_detection, bench_rectification);
criterion_main!(benches);
