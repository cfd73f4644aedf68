// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline — auto-crop, brightness, binarization, contrast
// boosting, and scan-to-PDF conversion for photographed documents.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{DetectionConfig, EnhanceMode, PaperSize};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::pdf::writer::PdfWriter;

use super::detect::detect_document;
use super::rectify::four_point_transform;

/// Lowest brightness offset accepted by [`ScanEnhancer::adjust_brightness`].
pub const BRIGHTNESS_MIN: i32 = -50;
/// Highest brightness offset accepted by [`ScanEnhancer::adjust_brightness`].
pub const BRIGHTNESS_MAX: i32 = 50;

/// Enhances photographed documents for archiving and OCR.
///
/// Provides the pipeline of operations a scan goes through after capture:
/// auto-crop to the detected page, brightness, grayscale conversion,
/// contrast enhancement and binarization. The result can be exported
/// directly to PDF.
pub struct ScanEnhancer {
    image: DynamicImage,
    /// Target paper size for PDF output.
    paper_size: PaperSize,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Create an enhancer from raw image bytes (JPEG, PNG, TIFF, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], paper_size: PaperSize) -> Result<Self> {
        let image = ImageProcessor::from_bytes(data)?.into_dynamic();
        info!(
            width = image.width(),
            height = image.height(),
            "Scan image loaded"
        );
        Ok(Self { image, paper_size })
    }

    /// Create an enhancer from a file path.
    pub fn open(path: impl AsRef<std::path::Path>, paper_size: PaperSize) -> Result<Self> {
        let image = ImageProcessor::open(path)?.into_dynamic();
        Ok(Self { image, paper_size })
    }

    pub fn from_dynamic(image: DynamicImage, paper_size: PaperSize) -> Self {
        Self { image, paper_size }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    pub fn paper_size(&self) -> PaperSize {
        self.paper_size
    }

    // -- Auto-crop ------------------------------------------------------------

    /// Detect the document outline and warp it to a flat rectangle.
    ///
    /// Returns [`ScanwerkError::DocumentNotFound`] when no outline qualifies;
    /// `self` is borrowed so the caller keeps the uncropped image in that case.
    #[instrument(skip(self, config))]
    pub fn auto_crop(&self, config: &DetectionConfig) -> Result<Self> {
        let detection = detect_document(&self.image, config).ok_or_else(|| {
            warn!("No document outline found");
            ScanwerkError::DocumentNotFound
        })?;
        info!(
            strategy = ?detection.strategy,
            area_ratio = detection.area_ratio,
            "Document outline detected"
        );

        let cropped = four_point_transform(&self.image, &detection.quad)?;
        Ok(Self {
            image: cropped,
            paper_size: self.paper_size,
        })
    }

    // -- Tone -----------------------------------------------------------------

    /// Shift brightness by `value`, clamped to
    /// [`BRIGHTNESS_MIN`]..=[`BRIGHTNESS_MAX`].
    pub fn adjust_brightness(self, value: i32) -> Self {
        let clamped = value.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX);
        if clamped != value {
            debug!(value, clamped, "Brightness clamped");
        }
        let image = ImageProcessor::from_dynamic(self.image)
            .adjust_brightness(clamped)
            .into_dynamic();
        Self {
            image,
            paper_size: self.paper_size,
        }
    }

    pub fn grayscale(self) -> Self {
        Self {
            image: ImageProcessor::from_dynamic(self.image)
                .grayscale()
                .into_dynamic(),
            paper_size: self.paper_size,
        }
    }

    // -- Binarization ---------------------------------------------------------

    /// Apply adaptive thresholding to produce a black-and-white image.
    ///
    /// For each pixel the threshold is the mean intensity within a
    /// `block_radius` neighbourhood, minus a constant `c`. Pixels darker than
    /// the local threshold become black; others become white.
    ///
    /// A typical `block_radius` is 15 and `c` is 10.
    #[instrument(skip(self))]
    pub fn binarize(self, block_radius: u32, c: i32) -> Self {
        info!(block_radius, c, "Applying adaptive binarization");

        let gray = self.image.to_luma8();
        let (width, height) = gray.dimensions();
        let integral = IntegralImage::new(&gray);

        let output = GrayImage::from_fn(width, height, |x, y| {
            let local_mean = integral.region_mean(x, y, block_radius);
            let threshold = (local_mean as i32 - c).clamp(0, 255) as u8;
            let value = gray.get_pixel(x, y).0[0];
            Luma([if value < threshold { 0u8 } else { 255u8 }])
        });

        debug!("Binarization complete");
        Self {
            image: DynamicImage::ImageLuma8(output),
            paper_size: self.paper_size,
        }
    }

    /// Global binarization with the threshold chosen by Otsu's method.
    #[instrument(skip(self))]
    pub fn binarize_otsu(self) -> Self {
        let gray = self.image.to_luma8();
        let threshold = otsu_level(&gray);
        info!(threshold, "Applying Otsu binarization");

        let mut output = gray;
        for pixel in output.pixels_mut() {
            pixel.0[0] = if pixel.0[0] <= threshold { 0 } else { 255 };
        }

        Self {
            image: DynamicImage::ImageLuma8(output),
            paper_size: self.paper_size,
        }
    }

    // -- Enhancement pipeline -------------------------------------------------

    /// Grayscale, contrast ×1.4, then adaptive binarization (15, 10).
    #[instrument(skip(self))]
    pub fn enhance_scan(self) -> Self {
        info!("Running full scan enhancement pipeline");

        let paper_size = self.paper_size;
        let image = ImageProcessor::from_dynamic(self.image)
            .grayscale()
            .adjust_contrast(1.4)
            .into_dynamic();

        Self { image, paper_size }.binarize(15, 10)
    }

    /// Apply a colour mode and brightness offset in one step.
    ///
    /// Brightness is applied first so that it also influences the
    /// thresholds of the black-and-white modes.
    #[instrument(skip(self))]
    pub fn apply(self, mode: EnhanceMode, brightness: i32) -> Self {
        let adjusted = self.adjust_brightness(brightness);
        match mode {
            EnhanceMode::Color => adjusted,
            EnhanceMode::Grayscale => adjusted.grayscale(),
            EnhanceMode::BlackAndWhite => adjusted.enhance_scan(),
            EnhanceMode::Otsu => adjusted.grayscale().binarize_otsu(),
        }
    }

    // -- Scan to PDF ----------------------------------------------------------

    /// Embed the working image in a single-page PDF sized to the configured
    /// paper size.
    #[instrument(skip(self))]
    pub fn scan_to_pdf(&self) -> Result<Vec<u8>> {
        info!(paper = ?self.paper_size, "Converting scan to PDF");

        let png_bytes = ImageProcessor::from_dynamic(self.image.clone()).to_png_bytes()?;

        let mut writer = PdfWriter::new(self.paper_size);
        writer.set_title("Scanned Document");
        let pdf_bytes = writer.create_from_image(&png_bytes)?;

        debug!(pdf_bytes = pdf_bytes.len(), "Scan-to-PDF complete");
        Ok(pdf_bytes)
    }
}

// -- Integral image -----------------------------------------------------------

/// Summed-area table of a grayscale image.
///
/// `table[y * (width + 1) + x]` holds the sum of all pixels in the rectangle
/// `[0, x) × [0, y)`; the first row and column are zero.
struct IntegralImage {
    table: Vec<u64>,
    width: u32,
    height: u32,
}

impl IntegralImage {
    fn new(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let stride = (width + 1) as usize;
        let mut table = vec![0u64; stride * (height + 1) as usize];

        for y in 0..height {
            let mut row_sum: u64 = 0;
            for x in 0..width {
                row_sum += gray.get_pixel(x, y).0[0] as u64;
                let idx = (y + 1) as usize * stride + (x + 1) as usize;
                let above = y as usize * stride + (x + 1) as usize;
                table[idx] = row_sum + table[above];
            }
        }

        Self {
            table,
            width,
            height,
        }
    }

    /// Mean of the square window of `radius` around (cx, cy), clipped to the
    /// image bounds.
    fn region_mean(&self, cx: u32, cy: u32, radius: u32) -> f64 {
        let stride = (self.width + 1) as usize;

        let x1 = cx.saturating_sub(radius) as usize;
        let y1 = cy.saturating_sub(radius) as usize;
        let x2 = (cx as usize + radius as usize + 1).min(self.width as usize);
        let y2 = (cy as usize + radius as usize + 1).min(self.height as usize);

        let area = ((x2 - x1) * (y2 - y1)) as f64;
        if area == 0.0 {
            return 128.0;
        }

        let sum = self.table[y2 * stride + x2] as f64
            - self.table[y1 * stride + x2] as f64
            - self.table[y2 * stride + x1] as f64
            + self.table[y1 * stride + x1] as f64;

        sum / area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    fn flat(value: u8) -> ScanEnhancer {
        ScanEnhancer::from_dynamic(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([value, value, value]))),
            PaperSize::A4,
        )
    }

    /// Light page on a dark table, slightly rotated.
    fn photographed_page() -> DynamicImage {
        let mut img = GrayImage::from_pixel(600, 800, Luma([35u8]));
        let outline = [
            Point::new(110, 90),
            Point::new(500, 120),
            Point::new(480, 700),
            Point::new(90, 680),
        ];
        draw_polygon_mut(&mut img, &outline, Luma([235u8]));
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn brightness_is_clamped_to_slider_range() {
        let out = flat(100).adjust_brightness(200).into_dynamic().to_rgb8();
        assert_eq!(out.get_pixel(0, 0).0, [150, 150, 150]);

        let out = flat(100).adjust_brightness(-200).into_dynamic().to_rgb8();
        assert_eq!(out.get_pixel(0, 0).0, [50, 50, 50]);
    }

    #[test]
    fn auto_crop_returns_the_page() {
        let enhancer = ScanEnhancer::from_dynamic(photographed_page(), PaperSize::A4);
        let cropped = enhancer.auto_crop(&DetectionConfig::default()).unwrap();
        let img = cropped.as_dynamic().to_luma8();

        // Roughly 390 × 580 for the outline above.
        let (w, h) = img.dimensions();
        assert!((370..=410).contains(&w), "width {w}");
        assert!((560..=600).contains(&h), "height {h}");

        let light = img.pixels().filter(|p| p.0[0] > 128).count();
        assert!(light as f64 > 0.9 * (w * h) as f64);
    }

    #[test]
    fn auto_crop_without_document_is_an_error() {
        let enhancer = flat(128);
        let err = enhancer.auto_crop(&DetectionConfig::default()).err();
        assert!(matches!(err, Some(ScanwerkError::DocumentNotFound)));
        // The input is left untouched.
        assert_eq!(enhancer.as_dynamic().width(), 32);
    }

    #[test]
    fn adaptive_binarization_keeps_text_on_uneven_light() {
        // Horizontal lighting gradient with a dark stroke in the middle.
        let mut img = GrayImage::from_fn(120, 60, |x, _| Luma([(120 + x) as u8]));
        for y in 25..35 {
            for x in 10..110 {
                let base = img.get_pixel(x, y).0[0];
                img.put_pixel(x, y, Luma([base - 80]));
            }
        }
        let out = ScanEnhancer::from_dynamic(DynamicImage::ImageLuma8(img), PaperSize::A4)
            .binarize(15, 10)
            .into_dynamic()
            .to_luma8();

        assert_eq!(out.get_pixel(60, 30).0[0], 0);
        assert_eq!(out.get_pixel(60, 5).0[0], 255);
        assert_eq!(out.get_pixel(115, 55).0[0], 255);
    }

    #[test]
    fn otsu_splits_bimodal_image() {
        let img = GrayImage::from_fn(40, 40, |x, _| Luma([if x < 20 { 40 } else { 210 }]));
        let out = ScanEnhancer::from_dynamic(DynamicImage::ImageLuma8(img), PaperSize::A4)
            .binarize_otsu()
            .into_dynamic()
            .to_luma8();
        assert_eq!(out.get_pixel(5, 5).0[0], 0);
        assert_eq!(out.get_pixel(35, 5).0[0], 255);
    }

    #[test]
    fn apply_modes_produce_expected_colour_types() {
        let color = flat(90).apply(EnhanceMode::Color, 10).into_dynamic();
        assert_eq!(color.to_rgb8().get_pixel(1, 1).0, [100, 100, 100]);

        let gray = flat(90).apply(EnhanceMode::Grayscale, 0).into_dynamic();
        assert!(matches!(gray, DynamicImage::ImageLuma8(_)));

        for mode in [EnhanceMode::BlackAndWhite, EnhanceMode::Otsu] {
            let bw = flat(90).apply(mode, 0).into_dynamic().to_luma8();
            assert!(bw.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        }
    }

    #[test]
    fn scan_to_pdf_produces_pdf_bytes() {
        let pdf = flat(200).scan_to_pdf().unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
