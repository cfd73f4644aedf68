// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Input --
    #[error("no image loaded")]
    NoImageLoaded,

    #[error("unsupported image type: {0}")]
    UnsupportedImage(String),

    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    // -- Processing --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("no document outline found in image")]
    DocumentNotFound,

    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("OCR support is not available in this build")]
    OcrUnavailable,

    #[error("OCR model file not found: {}", .0.display())]
    OcrModelsMissing(std::path::PathBuf),

    // -- Output --
    #[error("no cropped image to save")]
    NothingToSave,

    #[error("no pages to export")]
    NoPages,

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;
