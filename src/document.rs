use std::{fs, path::Path};

use printpdf::{IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, Pt};
use thiserror::Error;

use crate::{
    LINE_SPACING, PAGE_BOTTOM, PAGE_HEADING_LEFT, PAGE_HEADING_TOP, PAGE_LEFT, PAGE_TOP,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLine {
    pub text: String,
    pub font_size: u8,
}

impl DocumentLine {
    pub fn new(text: impl Into<String>, font_size: u8) -> Self {
        Self {
            text: text.into(),
            font_size,
        }
    }
}

#[derive(Debug, Error)]
#[error("Failed to render document: {info}")]
pub struct RenderError {
    info: String,
}

impl RenderError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

/// Sink that turns ordered text lines into a binary document. The first
/// line is the heading.
pub trait DocumentRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn render(&self, lines: &[DocumentLine]) -> Result<Vec<u8>, RenderError>;
}

/// UTF-8 text output, paginated with form feeds.
#[derive(Debug, Clone, Copy)]
pub struct PlainTextRenderer {
    lines_per_page: usize,
}

impl PlainTextRenderer {
    pub fn new(lines_per_page: usize) -> Self {
        Self {
            lines_per_page: lines_per_page.max(1),
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new(((PAGE_TOP - PAGE_BOTTOM) / LINE_SPACING + 1) as usize)
    }
}

impl DocumentRenderer for PlainTextRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn render(&self, lines: &[DocumentLine]) -> Result<Vec<u8>, RenderError> {
        let pages: Vec<String> = lines
            .chunks(self.lines_per_page)
            .map(|page| {
                page.iter()
                    .map(|line| format!("{}\n", line.text))
                    .collect::<String>()
            })
            .collect();

        Ok(pages.join("\u{c}").into_bytes())
    }
}

/// A line placed on a page, in points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement<'a> {
    x: u32,
    y: u32,
    line: &'a DocumentLine,
}

/// Heading at the top of the first page, then one line every
/// `LINE_SPACING` points. A line that would fall below `PAGE_BOTTOM`
/// starts a new page.
fn layout(lines: &[DocumentLine]) -> Vec<Vec<Placement<'_>>> {
    let Some((heading, body)) = lines.split_first() else {
        return vec![vec![]];
    };

    let mut pages = vec![vec![Placement {
        x: PAGE_HEADING_LEFT,
        y: PAGE_HEADING_TOP,
        line: heading,
    }]];
    let mut y = PAGE_TOP;

    for line in body {
        if y < PAGE_BOTTOM {
            pages.push(vec![]);
            y = PAGE_TOP;
        }
        if let Some(page) = pages.last_mut() {
            page.push(Placement { x: PAGE_LEFT, y, line });
        }
        y = y.saturating_sub(LINE_SPACING);
    }

    pages
}

/// A4 PDF output with an embedded TrueType font, so Cyrillic text renders.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    font: Vec<u8>,
}

impl PdfRenderer {
    pub fn new(font: Vec<u8>) -> Self {
        Self { font }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let font = fs::read(path)
            .map_err(|e| RenderError::new(&format!("{}: {e}", path.display())))?;

        Ok(Self::new(font))
    }

    fn load_font(&self, document: &PdfDocumentReference) -> Result<IndirectFontRef, RenderError> {
        document
            .add_external_font(self.font.as_slice())
            .map_err(|e| RenderError::new(&e.to_string()))
    }
}

impl DocumentRenderer for PdfRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, lines: &[DocumentLine]) -> Result<Vec<u8>, RenderError> {
        let (document, first_page, first_layer) =
            PdfDocument::new("Shopping list", Mm(210.0), Mm(297.0), "Layer 1");
        let font = self.load_font(&document)?;

        for (i, page) in layout(lines).into_iter().enumerate() {
            let (page_index, layer_index) = if i == 0 {
                (first_page, first_layer)
            } else {
                document.add_page(Mm(210.0), Mm(297.0), "Layer 1")
            };
            let layer = document.get_page(page_index).get_layer(layer_index);

            for placement in page {
                layer.use_text(
                    placement.line.text.clone(),
                    f32::from(placement.line.font_size),
                    Pt(placement.x as f32).into(),
                    Pt(placement.y as f32).into(),
                    &font,
                );
            }
        }

        document
            .save_to_bytes()
            .map_err(|e| RenderError::new(&e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT: &[u8] = include_bytes!("../data/fonts/DejaVuSerif.ttf");

    fn lines(count: usize) -> Vec<DocumentLine> {
        (1..=count)
            .map(|n| DocumentLine::new(format!("{n}. line"), 12))
            .collect()
    }

    #[test]
    fn default_page_fits_layout() {
        assert_eq!(PlainTextRenderer::default().lines_per_page, 28);
    }

    #[test]
    fn single_page_has_no_page_break() {
        let output = PlainTextRenderer::new(10).render(&lines(3)).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "1. line\n2. line\n3. line\n"
        );
    }

    #[test]
    fn long_documents_are_paginated_not_truncated() {
        let output = PlainTextRenderer::new(2).render(&lines(5)).unwrap();
        let text = String::from_utf8(output).unwrap();
        let pages: Vec<&str> = text.split('\u{c}').collect();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2], "5. line\n");
        assert_eq!(text.lines().filter(|l| !l.is_empty()).count(), 5);
    }

    #[test]
    fn empty_document_renders_empty() {
        let output = PlainTextRenderer::default().render(&[]).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn layout_places_heading_then_body() {
        let mut document = vec![DocumentLine::new("Список покупок:", 15)];
        document.extend(lines(2));
        let pages = layout(&document);

        assert_eq!(pages.len(), 1);
        assert_eq!((pages[0][0].x, pages[0][0].y), (230, 780));
        assert_eq!(pages[0][0].line.font_size, 15);
        assert_eq!((pages[0][1].x, pages[0][1].y), (50, 730));
        assert_eq!((pages[0][2].x, pages[0][2].y), (50, 705));
    }

    #[test]
    fn layout_breaks_pages_at_the_bottom_margin() {
        let mut document = vec![DocumentLine::new("Список покупок:", 15)];
        document.extend(lines(30));
        let pages = layout(&document);

        assert_eq!(pages.len(), 2);
        // heading plus 28 body lines
        assert_eq!(pages[0].len(), 29);
        assert_eq!(pages[0][28].y, 55);
        assert_eq!(pages[1].len(), 2);
        assert_eq!(pages[1][0].y, 730);
        assert_eq!(pages[1][1].line.text, "30. line");
    }

    #[test]
    fn pdf_embeds_the_shopping_list() {
        let renderer = PdfRenderer::new(FONT.to_vec());
        let output = renderer
            .render(&[
                DocumentLine::new("Список покупок:", 15),
                DocumentLine::new("1. Соль - 5 (г)", 12),
            ])
            .unwrap();

        assert_eq!(renderer.content_type(), "application/pdf");
        assert!(output.starts_with(b"%PDF-"));
    }

    #[test]
    fn empty_list_is_still_a_pdf() {
        let output = PdfRenderer::new(FONT.to_vec()).render(&[]).unwrap();
        assert!(output.starts_with(b"%PDF-"));
    }

    #[test]
    fn missing_font_file_is_a_render_error() {
        let error = PdfRenderer::from_file("data/fonts/missing.ttf").unwrap_err();
        assert!(error.to_string().contains("missing.ttf"));
    }
}
