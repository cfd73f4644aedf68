// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages shown as blocking dialogs.
//
// Every technical error is mapped to a short title, a plain-English message,
// and a severity that drives presentation in the front end.

use std::fmt;

use crate::error::ScanwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing is broken; the user just needs to do something first.
    Information,
    /// The user can fix it (better photo, different file, connect a camera).
    ActionRequired,
    /// Cannot be fixed by the user; needs a different build or a bug report.
    Permanent,
}

/// A dialog-ready error: title, message, and suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Dialog title.
    pub title: String,
    /// Plain English summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    pub severity: Severity,
}

impl fmt::Display for HumanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)?;
        if !self.suggestion.is_empty() {
            write!(f, "\n{}", self.suggestion)?;
        }
        Ok(())
    }
}

fn dialog(title: &str, message: &str, suggestion: impl Into<String>, severity: Severity) -> HumanError {
    HumanError {
        title: title.into(),
        message: message.into(),
        suggestion: suggestion.into(),
        severity,
    }
}

/// Convert a `ScanwerkError` into the dialog the user sees.
pub fn humanize_error(err: &ScanwerkError) -> HumanError {
    match err {
        ScanwerkError::NoImageLoaded => dialog(
            "No Image",
            "No image is loaded.",
            "Open an image or capture one from the camera first.",
            Severity::Information,
        ),

        ScanwerkError::UnsupportedImage(kind) => dialog(
            "Unsupported Image",
            "This type of file can't be scanned.",
            format!("Use a PNG or JPEG image instead. (File type: {kind})"),
            Severity::ActionRequired,
        ),

        ScanwerkError::CameraUnavailable(_) | ScanwerkError::PlatformUnavailable => dialog(
            "Camera Error",
            "Cannot access the camera.",
            "Check that a camera is connected and not in use by another program, or open an image file instead.",
            Severity::ActionRequired,
        ),

        ScanwerkError::ImageError(_) => dialog(
            "Image Error",
            "There's a problem with this image.",
            "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.",
            Severity::ActionRequired,
        ),

        ScanwerkError::DocumentNotFound => dialog(
            "No Document",
            "Could not detect document edges.",
            "Try higher contrast image.",
            Severity::ActionRequired,
        ),

        ScanwerkError::OcrError(_) => dialog(
            "OCR Error",
            "Text recognition didn't work on this scan.",
            "Try scanning the document again with better lighting, making sure the text is clear and in focus.",
            Severity::ActionRequired,
        ),

        ScanwerkError::OcrUnavailable => dialog(
            "OCR Unavailable",
            "Text recognition isn't included in this build.",
            "Rebuild with the `ocr` feature enabled to extract text.",
            Severity::Permanent,
        ),

        ScanwerkError::OcrModelsMissing(path) => dialog(
            "OCR Models Missing",
            "The text recognition models aren't installed.",
            format!(
                "Download text-detection.rten and text-recognition.rten into ~/.cache/ocrs, \
                 or pass --models with the folder that holds them. (Missing: {})",
                path.display()
            ),
            Severity::ActionRequired,
        ),

        ScanwerkError::NothingToSave => dialog(
            "No Image",
            "No cropped image to save.",
            "Run auto-crop on an image first.",
            Severity::Information,
        ),

        ScanwerkError::NoPages => dialog(
            "No Pages",
            "There is nothing to export.",
            "Add pages or scan an image first.",
            Severity::Information,
        ),

        ScanwerkError::PdfError(_) => dialog(
            "PDF Error",
            "The PDF could not be created.",
            "Try again with fewer or smaller pages.",
            Severity::Permanent,
        ),

        ScanwerkError::Config(detail) => dialog(
            "Settings Error",
            "The settings file has a problem.",
            format!("Fix or delete the settings file to restore defaults. ({detail})"),
            Severity::ActionRequired,
        ),

        ScanwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => dialog(
                "File Not Found",
                "The file couldn't be found.",
                "It may have been moved or deleted. Try choosing the file again.",
                Severity::ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => dialog(
                "Permission Denied",
                "Scanwerk doesn't have permission to use that file.",
                "Check the file permissions, or choose a different location.",
                Severity::ActionRequired,
            ),
            _ => dialog(
                "File Error",
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your disk may be full.",
                Severity::ActionRequired,
            ),
        },

        ScanwerkError::Serialization(_) => dialog(
            "Internal Error",
            "Scanwerk had an internal data problem.",
            "Try again. If this keeps happening, please report it.",
            Severity::Permanent,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_not_found_uses_contrast_hint() {
        let human = humanize_error(&ScanwerkError::DocumentNotFound);
        assert_eq!(human.title, "No Document");
        assert!(human.suggestion.contains("higher contrast"));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn no_pages_asks_for_a_scan() {
        let human = humanize_error(&ScanwerkError::NoPages);
        assert_eq!(human.suggestion, "Add pages or scan an image first.");
        assert_eq!(human.severity, Severity::Information);
    }

    #[test]
    fn platform_unavailable_reads_as_camera_error() {
        let human = humanize_error(&ScanwerkError::PlatformUnavailable);
        assert_eq!(human.title, "Camera Error");
        assert_eq!(human.message, "Cannot access the camera.");
    }

    #[test]
    fn ocr_unavailable_asks_for_the_feature() {
        let human = humanize_error(&ScanwerkError::OcrUnavailable);
        assert_eq!(human.title, "OCR Unavailable");
        assert!(human.suggestion.contains("`ocr` feature"));
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn missing_models_say_where_to_put_them() {
        let err = ScanwerkError::OcrModelsMissing("/m/text-detection.rten".into());
        let human = humanize_error(&err);
        assert_eq!(human.title, "OCR Models Missing");
        assert!(human.suggestion.contains("text-detection.rten"));
        assert!(human.suggestion.contains("text-recognition.rten"));
        assert!(human.suggestion.contains("~/.cache/ocrs"));
        assert!(human.suggestion.contains("--models"));
        assert!(human.suggestion.contains("/m/text-detection.rten"));
        assert!(!human.suggestion.contains("feature"));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn io_not_found_is_distinguished() {
        let err = ScanwerkError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).title, "File Not Found");

        let err = ScanwerkError::Io(std::io::Error::other("disk"));
        assert_eq!(humanize_error(&err).title, "File Error");
    }

    #[test]
    fn display_includes_suggestion_line() {
        let text = humanize_error(&ScanwerkError::NothingToSave).to_string();
        assert!(text.starts_with("No Image: No cropped image to save."));
        assert!(text.contains('\n'));
    }
}
