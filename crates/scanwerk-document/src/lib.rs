// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document — Document processing for the Scanwerk scanner.
//
// Provides document edge detection and perspective rectification (auto-crop),
// image processing (grayscale, brightness, contrast, binarization), OCR, and
// searchable multi-page PDF export.

pub mod image;
pub mod page;
pub mod pdf;
pub mod scan;

// Re-export the primary items so callers can use `scanwerk_document::PdfWriter` etc.
pub use image::processor::ImageProcessor;
pub use page::ScannedPage;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
pub use scan::detect::{Detection, DetectionStrategy, detect_document};
pub use scan::enhance::ScanEnhancer;
pub use scan::geometry::Quad;
pub use scan::recognizer::TextRecognizer;
pub use scan::rectify::four_point_transform;

#[cfg(feature = "ocr")]
pub use scan::ocr::{OcrConfig, OcrEngine};
