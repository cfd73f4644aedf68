// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect exported documents using the `lopdf` crate.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument};

/// Read-only view of an existing PDF, used to verify exports.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            ScanwerkError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            ScanwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height in points of page `page_number` (1-indexed), taken
    /// from its /MediaBox (inherited from the page tree if needed).
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        let pages = self.document.get_pages();
        let page_id: ObjectId = *pages.get(&page_number).ok_or_else(|| {
            ScanwerkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let mut dict = self.dictionary(page_id)?;
        loop {
            if let Ok(media_box) = dict.get(b"MediaBox") {
                return media_box_size(media_box);
            }
            let parent = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .map_err(|_| ScanwerkError::PdfError("page has no /MediaBox".into()))?;
            dict = self.dictionary(parent)?;
        }
    }

    fn dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        self.document
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|err| ScanwerkError::PdfError(format!("cannot read object {:?}: {}", id, err)))
    }
}

fn media_box_size(media_box: &Object) -> Result<(f32, f32)> {
    let values = media_box
        .as_array()
        .map_err(|err| ScanwerkError::PdfError(format!("malformed /MediaBox: {}", err)))?
        .iter()
        .map(|v| v.as_float())
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|err| ScanwerkError::PdfError(format!("malformed /MediaBox: {}", err)))?;

    match values.as_slice() {
        [x0, y0, x1, y1] => Ok(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => Err(ScanwerkError::PdfError(format!(
            "/MediaBox has {} entries",
            values.len()
        ))),
    }
}
