// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition seam — lets callers run OCR without depending on a
// particular engine being compiled in.

use image::DynamicImage;
use scanwerk_core::error::Result;

/// Anything that can turn a page image into plain text.
///
/// [`OcrEngine`](super::ocr::OcrEngine) implements this when the `ocr`
/// feature is enabled. Sessions and tests hold a `&dyn TextRecognizer`.
pub trait TextRecognizer {
    /// Recognise all text in `image`, lines separated by `\n`.
    fn recognize_text(&self, image: &DynamicImage) -> Result<String>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        (**self).recognize_text(image)
    }
}
