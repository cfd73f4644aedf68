// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A page queued for the output document.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use scanwerk_core::PageId;

/// One page of a multi-page scan: the processed image plus the text
/// recognised on it (empty when OCR was skipped or found nothing).
#[derive(Debug, Clone)]
pub struct ScannedPage {
    pub id: PageId,
    pub image: DynamicImage,
    pub text: String,
    pub added_at: DateTime<Utc>,
}

impl ScannedPage {
    pub fn new(image: DynamicImage, text: impl Into<String>) -> Self {
        Self {
            id: PageId::new(),
            image,
            text: text.into(),
            added_at: Utc::now(),
        }
    }

    /// True when the page carries recognised text worth laying out.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
