// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — searchable multi-page documents from scanned pages, and
// single-image PDFs, using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use image::DynamicImage;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectId, XObjectTransform,
};
use scanwerk_core::PaperSize;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument, warn};

use crate::page::ScannedPage;

/// Horizontal margin around the image, split evenly left and right.
const IMAGE_SIDE_MARGINS_PT: f32 = 100.0;
/// Vertical room reserved around the image (top offset plus space for text).
const IMAGE_VERTICAL_MARGINS_PT: f32 = 200.0;
/// Distance from the top of the page to the top edge of the image.
const IMAGE_TOP_PT: f32 = 100.0;
/// Gap between the image's bottom edge and the first text baseline.
const TEXT_GAP_PT: f32 = 80.0;
const TEXT_LEFT_PT: f32 = 50.0;
const TEXT_FONT_SIZE_PT: f32 = 10.0;
const TEXT_LINE_HEIGHT_PT: f32 = 12.0;
/// Text never goes below this baseline; it continues on a new page instead.
const TEXT_BOTTOM_PT: f32 = 50.0;
/// First baseline on a text-only continuation page, measured from the top.
const CONTINUATION_TOP_PT: f32 = 50.0;
/// Average Helvetica glyph width as a fraction of the font size.
const HELVETICA_AVG_WIDTH: f32 = 0.5;

/// Placement of a scanned image on a PDF page, in points from the
/// bottom-left corner (PDF user space).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    /// Index into the page slice passed to [`layout_pages`].
    pub page_index: usize,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

/// One PDF page worth of drawing instructions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub image: Option<ImagePlacement>,
    /// Text baselines and their content.
    pub lines: Vec<(f32, String)>,
}

/// Creates PDF documents from scanned pages or raster images.
pub struct PdfWriter {
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    fn page_dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.page_dimensions();
        (w.into_pt().0, h.into_pt().0)
    }

    // -- Searchable multi-page PDF --------------------------------------------

    /// Lay out every scanned page as an image followed by its recognised text.
    ///
    /// Each scanned page starts a new PDF page; text that runs past the bottom
    /// margin continues on text-only pages. Returns [`ScanwerkError::NoPages`]
    /// for an empty slice.
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub fn create_searchable(&self, pages: &[ScannedPage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(ScanwerkError::NoPages);
        }

        let (page_w_pt, page_h_pt) = self.page_dimensions_pt();
        let title = self.title.as_deref().unwrap_or("Scanned Document");
        info!(paper = ?self.paper_size, title, "Creating searchable PDF");

        let layouts = layout_pages(pages, page_w_pt, page_h_pt);

        let mut doc = PdfDocument::new(title);
        let image_ids: Vec<XObjectId> = pages
            .iter()
            .map(|page| doc.add_image(&raw_image(&page.image)))
            .collect();

        let (page_w, page_h) = self.page_dimensions();
        let pdf_pages: Vec<PdfPage> = layouts
            .iter()
            .map(|layout| PdfPage::new(page_w, page_h, page_ops(layout, &image_ids)))
            .collect();

        debug!(
            scanned = pages.len(),
            pdf_pages = pdf_pages.len(),
            "Layout complete"
        );
        doc.with_pages(pdf_pages);
        Ok(save(&doc))
    }

    // -- Image to PDF ---------------------------------------------------------

    /// Create a single-page PDF containing the given encoded image.
    ///
    /// The image is scaled to fit within the page margins while preserving its
    /// aspect ratio, and centred.
    #[instrument(skip(self, image_bytes), fields(bytes_len = image_bytes.len()))]
    pub fn create_from_image(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Scanned Image");

        info!(paper = ?self.paper_size, title, "Creating image PDF");

        let dynamic_image = ::image::load_from_memory(image_bytes).map_err(|err| {
            ScanwerkError::ImageError(format!("failed to decode image for PDF: {}", err))
        })?;

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw_image(&dynamic_image));

        let margin_mm: f32 = 15.0;
        let usable_w_pt = Mm(page_w.0 - 2.0 * margin_mm).into_pt().0;
        let usable_h_pt = Mm(page_h.0 - 2.0 * margin_mm).into_pt().0;

        // Native size at 150 DPI.
        let dpi: f32 = 150.0;
        let img_w_pt = dynamic_image.width() as f32 / dpi * 72.0;
        let img_h_pt = dynamic_image.height() as f32 / dpi * 72.0;

        let scale = (usable_w_pt / img_w_pt).min(usable_h_pt / img_h_pt).min(1.0);
        let rendered_w_pt = img_w_pt * scale;
        let rendered_h_pt = img_h_pt * scale;

        let margin_pt = Mm(margin_mm).into_pt().0;
        let x_offset = margin_pt + (usable_w_pt - rendered_w_pt) / 2.0;
        let y_offset = margin_pt + (usable_h_pt - rendered_h_pt) / 2.0;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(dpi),
                rotate: None,
            },
        }];

        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);
        debug!(rendered_w_pt, rendered_h_pt, scale, "Image placed on page");

        Ok(save(&doc))
    }

    // -- File output ----------------------------------------------------------

    /// Create a searchable PDF and write it to `path`.
    pub fn write_to_file(&self, pages: &[ScannedPage], path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.create_searchable(pages)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            path = %path.as_ref().display(),
            bytes = bytes.len(),
            "Wrote searchable PDF"
        );
        Ok(())
    }
}

// -- Layout -------------------------------------------------------------------

/// Compute the page plan for `pages` on a `page_w` × `page_h` pt sheet.
///
/// Images are placed at 72 dpi (one pixel per point), shrunk by
/// `min((W - 100) / w, (H - 200) / h, 1)`, centred horizontally with their top
/// edge 100 pt below the top of the page. Text follows 80 pt below the image
/// in 12 pt steps, word-wrapped to `W - 100`.
pub fn layout_pages(pages: &[ScannedPage], page_w: f32, page_h: f32) -> Vec<PageLayout> {
    let max_chars = chars_per_line(page_w - IMAGE_SIDE_MARGINS_PT);
    let mut layouts = Vec::new();

    for (page_index, page) in pages.iter().enumerate() {
        let (img_w, img_h) = (page.image.width() as f32, page.image.height() as f32);
        let scale = ((page_w - IMAGE_SIDE_MARGINS_PT) / img_w)
            .min((page_h - IMAGE_VERTICAL_MARGINS_PT) / img_h)
            .min(1.0);
        let x = (page_w - img_w * scale) / 2.0;
        let y = page_h - img_h * scale - IMAGE_TOP_PT;

        let mut current = PageLayout {
            image: Some(ImagePlacement {
                page_index,
                x,
                y,
                scale,
            }),
            lines: Vec::new(),
        };

        let text = if page.has_text() { page.text.as_str() } else { "" };
        let mut text_y = y - TEXT_GAP_PT;
        for line in wrap_text(text, max_chars) {
            if text_y < TEXT_BOTTOM_PT {
                layouts.push(std::mem::take(&mut current));
                text_y = page_h - CONTINUATION_TOP_PT;
            }
            current.lines.push((text_y, line));
            text_y -= TEXT_LINE_HEIGHT_PT;
        }
        layouts.push(current);
    }

    layouts
}

fn chars_per_line(width_pt: f32) -> usize {
    ((width_pt / (HELVETICA_AVG_WIDTH * TEXT_FONT_SIZE_PT)) as usize).max(1)
}

fn page_ops(layout: &PageLayout, image_ids: &[XObjectId]) -> Vec<Op> {
    let mut ops = Vec::new();

    if let Some(placement) = layout.image {
        match image_ids.get(placement.page_index) {
            Some(id) => ops.push(Op::UseXobject {
                id: id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(placement.x)),
                    translate_y: Some(Pt(placement.y)),
                    scale_x: Some(placement.scale),
                    scale_y: Some(placement.scale),
                    dpi: Some(72.0),
                    rotate: None,
                },
            }),
            None => warn!(index = placement.page_index, "Missing image for page"),
        }
    }

    for (y, line) in &layout.lines {
        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(TEXT_LEFT_PT),
                y: Pt(*y),
            },
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(TEXT_FONT_SIZE_PT),
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.clone())],
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::EndTextSection);
    }

    ops
}

fn raw_image(image: &DynamicImage) -> RawImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width: width as usize,
        height: height as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    }
}

fn save(doc: &PdfDocument) -> Vec<u8> {
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        debug!(count = warnings.len(), "printpdf reported warnings");
    }
    output
}

// -- Text wrapping ------------------------------------------------------------

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then performs simple word-wrap within each
/// paragraph. Words longer than `max_width` are force-broken on character
/// boundaries. Blank lines are kept.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.lines() {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        let mut current_len = 0usize;

        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current_line.is_empty() {
                    result.push(std::mem::take(&mut current_line));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    let piece: String = chunk.iter().collect();
                    if chunks.peek().is_some() {
                        result.push(piece);
                    } else {
                        current_len = chunk.len();
                        current_line = piece;
                    }
                }
            } else if current_line.is_empty() {
                current_line.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current_line, word.to_string()));
                current_len = word_len;
            }
        }

        if !current_line.is_empty() {
            result.push(current_line);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use image::{Rgb, RgbImage};

    const A4_PT: (f32, f32) = (595.28, 841.89);

    fn page(w: u32, h: u32, text: &str) -> ScannedPage {
        ScannedPage::new(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([240, 240, 240]))),
            text,
        )
    }

    fn numbered_lines(n: usize) -> String {
        (1..=n).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn wrap_breaks_on_words() {
        let lines = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn wrap_force_breaks_long_words_and_keeps_blank_lines() {
        let lines = wrap_text("abcdefghij xy\n\nend", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy", "", "end"]);
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        let lines = wrap_text("ééééé", 5);
        assert_eq!(lines, vec!["ééééé"]);
    }

    #[test]
    fn small_image_is_not_upscaled_and_is_centred() {
        let layouts = layout_pages(&[page(200, 100, "")], A4_PT.0, A4_PT.1);
        assert_eq!(layouts.len(), 1);
        let placement = layouts[0].image.unwrap();
        assert_eq!(placement.scale, 1.0);
        assert!((placement.x - (A4_PT.0 - 200.0) / 2.0).abs() < 1e-3);
        assert!((placement.y - (A4_PT.1 - 100.0 - 100.0)).abs() < 1e-3);
        assert!(layouts[0].lines.is_empty());
    }

    #[test]
    fn blank_ocr_text_adds_no_continuation_pages() {
        let blank = "\n \n".repeat(200);
        let layouts = layout_pages(&[page(400, 600, &blank)], A4_PT.0, A4_PT.1);
        assert_eq!(layouts.len(), 1);
        assert!(layouts[0].lines.is_empty());
    }

    #[test]
    fn large_image_is_shrunk_to_fit() {
        let layouts = layout_pages(&[page(2000, 1000, "")], A4_PT.0, A4_PT.1);
        let placement = layouts[0].image.unwrap();
        assert!((placement.scale - (A4_PT.0 - 100.0) / 2000.0).abs() < 1e-6);
        assert!((placement.x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn text_starts_below_image_with_fixed_spacing() {
        let layouts = layout_pages(&[page(100, 100, "alpha\nbeta")], A4_PT.0, A4_PT.1);
        let image_y = layouts[0].image.unwrap().y;
        let lines = &layouts[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].1, "alpha");
        assert!((lines[0].0 - (image_y - 80.0)).abs() < 1e-3);
        assert!((lines[0].0 - lines[1].0 - 12.0).abs() < 1e-3);
    }

    #[test]
    fn overflowing_text_continues_on_text_only_pages() {
        // Image fills the page height, leaving room for only a few lines.
        let layouts = layout_pages(&[page(400, 2000, &numbered_lines(100))], A4_PT.0, A4_PT.1);
        assert!(layouts.len() >= 2);
        assert!(layouts[1].image.is_none());

        let first_continued = &layouts[1].lines[0];
        assert!((first_continued.0 - (A4_PT.1 - 50.0)).abs() < 1e-3);

        let total: usize = layouts.iter().map(|l| l.lines.len()).sum();
        assert_eq!(total, 100);
        for layout in &layouts {
            assert!(layout.lines.iter().all(|(y, _)| *y >= 50.0));
            assert!(!layout.lines.is_empty() || layout.image.is_some());
        }
    }

    #[test]
    fn each_scanned_page_starts_a_pdf_page() {
        let pages = [page(300, 400, "one"), page(300, 400, ""), page(300, 400, "three")];
        let layouts = layout_pages(&pages, A4_PT.0, A4_PT.1);
        assert_eq!(layouts.len(), 3);
        let indices: Vec<usize> = layouts.iter().map(|l| l.image.unwrap().page_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn searchable_pdf_has_one_page_per_scan() {
        let writer = PdfWriter::new(PaperSize::A4);
        let bytes = writer
            .create_searchable(&[page(120, 160, "hello"), page(160, 120, "world")])
            .unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 2);
    }

    #[test]
    fn overflow_adds_pdf_pages() {
        let writer = PdfWriter::new(PaperSize::A4);
        let bytes = writer
            .create_searchable(&[page(60, 600, &numbered_lines(120))])
            .unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert!(reader.page_count() >= 2, "{} pages", reader.page_count());
    }

    #[test]
    fn empty_page_list_is_an_error() {
        let writer = PdfWriter::new(PaperSize::A4);
        assert!(matches!(
            writer.create_searchable(&[]),
            Err(ScanwerkError::NoPages)
        ));
    }

    #[test]
    fn letter_paper_sets_media_box() {
        let writer = PdfWriter::new(PaperSize::Letter);
        let bytes = writer.create_searchable(&[page(50, 50, "")]).unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let (w, h) = reader.page_size(1).unwrap();
        // 216 × 279 mm.
        assert!((w - 612.0).abs() < 2.0, "width {w}");
        assert!((h - 791.0).abs() < 2.0, "height {h}");
    }

    #[test]
    fn write_to_file_creates_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        PdfWriter::new(PaperSize::A4)
            .write_to_file(&[page(10, 10, "x")], &path)
            .unwrap();
        assert_eq!(PdfReader::open(&path).unwrap().page_count(), 1);
    }
}
