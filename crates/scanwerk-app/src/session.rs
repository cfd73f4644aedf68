// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session — the working state of one scanning run: the loaded image, its
// cropped version, the current adjustments, the last OCR text, and the pages
// queued for export. Front ends drive it; it never talks to the user.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use scanwerk_bridge::NativeCamera;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{AppConfig, EnhanceMode};
use scanwerk_document::scan::enhance::{BRIGHTNESS_MAX, BRIGHTNESS_MIN};
use scanwerk_document::{ImageProcessor, PdfWriter, ScanEnhancer, ScannedPage, TextRecognizer};
use tracing::{debug, info, instrument, warn};

pub struct ScanSession {
    config: AppConfig,
    /// Image as loaded or captured.
    source: Option<DynamicImage>,
    source_path: Option<PathBuf>,
    /// Rectified document, once auto-crop has succeeded.
    cropped: Option<DynamicImage>,
    /// Base image (cropped if present, else source) with mode and brightness
    /// applied. Rebuilt from the base on every change.
    current: Option<DynamicImage>,
    brightness: i32,
    ocr_text: String,
    pages: Vec<ScannedPage>,
}

impl ScanSession {
    pub fn new(config: AppConfig) -> Self {
        let brightness = config.default_brightness.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX);
        Self {
            config,
            source: None,
            source_path: None,
            cropped: None,
            current: None,
            brightness,
            ocr_text: String::new(),
            pages: Vec::new(),
        }
    }

    // -- Loading --------------------------------------------------------------

    /// Load an image file, discarding any previous crop and adjustments.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn open_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let image = ImageProcessor::open(path)?.into_dynamic();
        self.load(image, Some(path.to_path_buf()));
        Ok(())
    }

    /// Take a photo with `camera` and make it the source image.
    ///
    /// Any camera failure, including the user cancelling, is reported as
    /// [`ScanwerkError::CameraUnavailable`] and leaves the session unchanged.
    #[instrument(skip_all)]
    pub fn capture<C: NativeCamera + ?Sized>(&mut self, camera: &C) -> Result<()> {
        let bytes = match camera.capture_image() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!("Capture cancelled");
                return Err(ScanwerkError::CameraUnavailable("capture cancelled".into()));
            }
            Err(err) => {
                warn!(error = %err, "Camera capture failed");
                return Err(ScanwerkError::CameraUnavailable(err.to_string()));
            }
        };

        let image = ImageProcessor::from_bytes(&bytes)?.into_dynamic();
        info!(width = image.width(), height = image.height(), "Frame captured");
        self.load(image, None);
        Ok(())
    }

    fn load(&mut self, image: DynamicImage, path: Option<PathBuf>) {
        self.source = Some(image);
        self.source_path = path;
        self.cropped = None;
        self.brightness = self
            .config
            .default_brightness
            .clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX);
        self.refresh();
    }

    // -- Editing --------------------------------------------------------------

    /// Detect the document in the source image and rectify it.
    ///
    /// On [`ScanwerkError::DocumentNotFound`] the previous crop (if any) is
    /// kept.
    #[instrument(skip(self))]
    pub fn auto_crop(&mut self) -> Result<()> {
        let source = self.source.as_ref().ok_or(ScanwerkError::NoImageLoaded)?;
        let cropped = ScanEnhancer::from_dynamic(source.clone(), self.config.paper_size)
            .auto_crop(&self.config.detection)?
            .into_dynamic();

        debug!(width = cropped.width(), height = cropped.height(), "Crop stored");
        self.cropped = Some(cropped);
        self.refresh();
        Ok(())
    }

    /// Set the brightness offset, clamped to the slider range.
    ///
    /// Always applied to the unadjusted base, so repeated calls do not stack.
    /// Returns the value actually used.
    pub fn set_brightness(&mut self, value: i32) -> i32 {
        self.brightness = value.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX);
        self.refresh();
        self.brightness
    }

    pub fn set_enhance_mode(&mut self, mode: EnhanceMode) {
        self.config.enhance_mode = mode;
        self.refresh();
    }

    fn refresh(&mut self) {
        let base = self.cropped.as_ref().or(self.source.as_ref());
        let current = base.map(|image| {
            ScanEnhancer::from_dynamic(image.clone(), self.config.paper_size)
                .apply(self.config.enhance_mode, self.brightness)
                .into_dynamic()
        });
        self.current = current;
    }

    /// The image the user is looking at: cropped or source, adjusted.
    pub fn current_image(&self) -> Option<&DynamicImage> {
        self.current.as_ref()
    }

    // -- OCR and pages --------------------------------------------------------

    /// Run OCR on the current image and remember the text for export.
    #[instrument(skip_all)]
    pub fn extract_text(&mut self, recognizer: &dyn TextRecognizer) -> Result<&str> {
        let image = self.current.as_ref().ok_or(ScanwerkError::NoImageLoaded)?;
        self.ocr_text = recognizer.recognize_text(image)?;
        info!(chars = self.ocr_text.len(), "Text extracted");
        Ok(&self.ocr_text)
    }

    /// Queue the current image as a page, with its OCR text when a recognizer
    /// is supplied. Returns the number of queued pages.
    #[instrument(skip_all)]
    pub fn add_page(&mut self, recognizer: Option<&dyn TextRecognizer>) -> Result<usize> {
        let image = self.current.as_ref().ok_or(ScanwerkError::NoImageLoaded)?;
        let text = match recognizer {
            Some(recognizer) => recognizer.recognize_text(image)?,
            None => String::new(),
        };
        self.pages.push(ScannedPage::new(image.clone(), text));
        info!(
            total = self.pages.len(),
            source = ?self.source_path,
            "Page added"
        );
        Ok(self.pages.len())
    }

    // -- Output ---------------------------------------------------------------

    /// Save the cropped (and adjusted) image as PNG or JPEG by extension.
    pub fn save_cropped(&self, path: impl AsRef<Path>) -> Result<()> {
        if self.cropped.is_none() {
            return Err(ScanwerkError::NothingToSave);
        }
        let image = self.current.as_ref().ok_or(ScanwerkError::NothingToSave)?;
        ImageProcessor::from_dynamic(image.clone()).save(path, self.config.jpeg_quality)
    }

    /// Write the queued pages as a searchable PDF.
    ///
    /// Without queued pages the current image is exported on its own, with
    /// the last extracted text. Returns the number of scanned pages written.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn export_pdf(&self, path: impl AsRef<Path>) -> Result<usize> {
        let mut writer = PdfWriter::new(self.config.paper_size);
        writer.set_title(self.config.pdf_title.clone());

        if !self.pages.is_empty() {
            writer.write_to_file(&self.pages, path)?;
            return Ok(self.pages.len());
        }

        let image = self.current.as_ref().ok_or(ScanwerkError::NoPages)?;
        let single = ScannedPage::new(image.clone(), self.ocr_text.clone());
        writer.write_to_file(std::slice::from_ref(&single), path)?;
        Ok(1)
    }
}
