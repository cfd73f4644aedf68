// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding, grayscale, brightness/contrast, resizing and
// encoding of scanned pages using the `image` crate.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use scanwerk_core::ImageKind;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor`, so
/// operations chain:
///
/// ```ignore
/// let png = ImageProcessor::open("page.jpg")?
///     .fit_within(1600, 1600)
///     .adjust_brightness(10)
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path. Only scan-input formats are accepted.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ImageKind::from_path(path)?;
        let bytes = std::fs::read(path)?;
        let processor = Self::from_bytes(&bytes)?;
        info!(
            width = processor.width(),
            height = processor.height(),
            "Image loaded"
        );
        Ok(processor)
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            ScanwerkError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Shrink the image to fit within `max_width` x `max_height`, preserving
    /// aspect ratio. Images that already fit are returned unchanged.
    #[instrument(skip(self))]
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        if self.width() <= max_width && self.height() <= max_height {
            return self;
        }
        let resized = self
            .image
            .resize(max_width, max_height, FilterType::Lanczos3);
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "Resize complete"
        );
        Self { image: resized }
    }

    pub fn grayscale(self) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Add `value` to every colour channel, clamped to [-255, 255].
    #[instrument(skip(self))]
    pub fn adjust_brightness(self, value: i32) -> Self {
        let clamped = value.clamp(-255, 255);
        if clamped == 0 {
            return self;
        }
        Self {
            image: self.image.brighten(clamped),
        }
    }

    /// Scale contrast around mid-grey. `factor` > 1.0 increases contrast,
    /// 1.0 is a no-op.
    #[instrument(skip(self))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        if (factor - 1.0).abs() < f32::EPSILON {
            return self;
        }
        // `image` takes a percentage: 0 leaves the image unchanged.
        let percent = (factor - 1.0) * 100.0;
        Self {
            image: self.image.adjust_contrast(percent),
        }
    }

    // -- Output ---------------------------------------------------------------

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.image
            .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|err| ScanwerkError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode as JPEG with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder).map_err(|err| {
            ScanwerkError::ImageError(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }

    /// Write the image to `path` as PNG or JPEG, chosen by extension.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>, jpeg_quality: u8) -> Result<()> {
        let path = path.as_ref();
        let kind = ImageKind::from_path(path)?;
        if !kind.is_writable() {
            return Err(ScanwerkError::UnsupportedImage(format!(
                "{} output",
                kind.mime_type()
            )));
        }
        let bytes = if kind == ImageKind::Jpeg {
            self.to_jpeg_bytes(jpeg_quality)?
        } else {
            self.to_png_bytes()?
        };
        std::fs::write(path, &bytes)?;
        info!(bytes = bytes.len(), "Image saved");
        Ok(())
    }
}
