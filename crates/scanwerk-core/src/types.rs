// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Scanwerk.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScanwerkError;

/// Unique identifier for a page added to the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raster formats accepted as scan input and produced as scan output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Jpeg,
    Png,
    Tiff,
    Bmp,
}

impl ImageKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
        }
    }

    /// Infer the image kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Infer the image kind from a path, rejecting anything that isn't an image.
    pub fn from_path(path: &Path) -> Result<Self, ScanwerkError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| {
            ScanwerkError::UnsupportedImage(if ext.is_empty() {
                path.display().to_string()
            } else {
                ext.to_string()
            })
        })
    }

    /// Whether the format can be written as a cropped-image output.
    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

/// Standard paper sizes for PDF export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaperSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

impl FromStr for PaperSize {
    type Err = ScanwerkError;

    /// Parse a paper name (`a4`, `letter`, …) or a custom `WIDTHxHEIGHT` in mm.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "a4" => Ok(Self::A4),
            "a3" => Ok(Self::A3),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "tabloid" => Ok(Self::Tabloid),
            other => {
                let parsed = other
                    .trim_end_matches("mm")
                    .split_once('x')
                    .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)));
                match parsed {
                    Some((width_mm, height_mm)) if width_mm > 0 && height_mm > 0 => {
                        Ok(Self::Custom {
                            width_mm,
                            height_mm,
                        })
                    }
                    _ => Err(ScanwerkError::Config(format!("unknown paper size `{s}`"))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_kind_from_extension_ignores_case() {
        assert_eq!(ImageKind::from_extension("JPG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("png"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_extension("pdf"), None);
    }

    #[test]
    fn image_kind_from_path_rejects_documents() {
        let err = ImageKind::from_path(Path::new("/tmp/report.pdf")).unwrap_err();
        assert!(matches!(err, ScanwerkError::UnsupportedImage(ext) if ext == "pdf"));
        assert!(ImageKind::from_path(Path::new("scan.jpeg")).is_ok());
    }

    #[test]
    fn only_png_and_jpeg_are_writable() {
        assert!(ImageKind::Png.is_writable());
        assert!(ImageKind::Jpeg.is_writable());
        assert!(!ImageKind::Tiff.is_writable());
        assert!(!ImageKind::Bmp.is_writable());
    }

    #[test]
    fn paper_size_parses_names_and_custom() {
        assert_eq!("A4".parse::<PaperSize>().unwrap(), PaperSize::A4);
        assert_eq!("letter".parse::<PaperSize>().unwrap(), PaperSize::Letter);
        assert_eq!(
            "100x150mm".parse::<PaperSize>().unwrap(),
            PaperSize::Custom {
                width_mm: 100,
                height_mm: 150
            }
        );
        assert!("0x10".parse::<PaperSize>().is_err());
        assert!("b5".parse::<PaperSize>().is_err());
    }

    #[test]
    fn default_paper_is_a4() {
        assert_eq!(PaperSize::default().dimensions_mm(), (210, 297));
    }
}
