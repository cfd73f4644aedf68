// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration, persisted as JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::PaperSize;
use crate::error::{Result, ScanwerkError};

const CONFIG_FILE: &str = "config.json";

/// Tuning parameters for document outline detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Height (px) of the downscaled working copy used for detection.
    pub working_height: u32,
    /// Gaussian blur sigma applied before edge detection.
    pub blur_sigma: f32,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub approx_epsilon: f64,
    /// How many of the largest contours are tested for a quadrilateral.
    pub max_candidates: usize,
    /// Minimum document area as a fraction of the working image.
    pub min_area_ratio: f32,
    /// Fall back to Hough line detection when no contour qualifies.
    pub line_fallback: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            working_height: 500,
            blur_sigma: 1.0,
            canny_low: 75.0,
            canny_high: 200.0,
            approx_epsilon: 0.02,
            max_candidates: 5,
            min_area_ratio: 0.05,
            line_fallback: false,
        }
    }
}

impl DetectionConfig {
    /// Reject values the detection pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.working_height < 32 {
            return Err(ScanwerkError::Config(format!(
                "working_height must be at least 32, got {}",
                self.working_height
            )));
        }
        if self.blur_sigma <= 0.0 {
            return Err(ScanwerkError::Config("blur_sigma must be positive".into()));
        }
        if self.canny_low > self.canny_high {
            return Err(ScanwerkError::Config(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        if !(self.approx_epsilon > 0.0 && self.approx_epsilon < 1.0) {
            return Err(ScanwerkError::Config(
                "approx_epsilon must be in (0, 1)".into(),
            ));
        }
        if self.max_candidates == 0 {
            return Err(ScanwerkError::Config("max_candidates must be non-zero".into()));
        }
        if !(0.0..1.0).contains(&self.min_area_ratio) {
            return Err(ScanwerkError::Config(
                "min_area_ratio must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

/// Post-crop enhancement applied before OCR and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhanceMode {
    /// Keep colour; only the brightness offset is applied.
    #[default]
    Color,
    Grayscale,
    /// Grayscale, contrast boost, and adaptive binarization.
    BlackAndWhite,
    /// Global Otsu binarization.
    Otsu,
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page size for exported PDFs.
    pub paper_size: PaperSize,
    pub detection: DetectionConfig,
    pub enhance_mode: EnhanceMode,
    /// Brightness offset applied to new images (-50..=50).
    pub default_brightness: i32,
    /// Quality used when saving cropped images as JPEG (1-100).
    pub jpeg_quality: u8,
    /// Title embedded in exported PDFs.
    pub pdf_title: String,
    /// Directory holding the OCR models; `None` uses the ocrs cache directory.
    pub ocr_model_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            detection: DetectionConfig::default(),
            enhance_mode: EnhanceMode::Color,
            default_brightness: 0,
            jpeg_quality: 90,
            pdf_title: "Scanned Document".into(),
            ocr_model_dir: None,
        }
    }
}

impl AppConfig {
    /// Load the config from `dir/config.json`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_str(&data).map_err(|err| {
            ScanwerkError::Config(format!("{}: {}", path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config, falling back to defaults on any error.
    pub fn load_or_default(dir: &Path) -> Self {
        Self::load_from(dir).unwrap_or_else(|err| {
            warn!(error = %err, "config unreadable, using defaults");
            Self::default()
        })
    }

    /// Write the config to `dir/config.json`, creating `dir` if needed.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ScanwerkError::Config(format!(
                "jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Directory holding `config.json`.
///
/// `$XDG_CONFIG_HOME/scanwerk`, falling back to `~/.config/scanwerk`.
pub fn config_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config")
    } else {
        PathBuf::from(".")
    };
    base.join("scanwerk")
}
