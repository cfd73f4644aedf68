// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — document detection, perspective rectification,
// enhancement, and optical character recognition (OCR).

pub mod detect;
pub mod enhance;
pub mod geometry;
pub mod recognizer;
pub mod rectify;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use detect::{Detection, DetectionStrategy, detect_document};
pub use enhance::ScanEnhancer;
pub use geometry::{Quad, order_corners};
pub use recognizer::TextRecognizer;
pub use rectify::four_point_transform;

#[cfg(feature = "ocr")]
pub use ocr::{OcrConfig, OcrEngine};
