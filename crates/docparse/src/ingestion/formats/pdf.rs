//! PDF decoding
//!
//! Text is pulled page by page with `lopdf` so sections keep their page
//! numbers. Documents whose content streams `lopdf` cannot read fall back to
//! `pdf-extract` over the whole file.

use std::path::Path;

use crate::error::{Error, Result};
use crate::ingestion::content::{ParsedContent, Section};
use crate::ingestion::registry::DocumentFormat;

pub fn decode(path: &Path) -> Result<ParsedContent> {
    let doc = lopdf::Document::load(path).map_err(|e| Error::file_parse("PDF", e))?;

    let pages = doc.get_pages();
    let mut content = ParsedContent::new(DocumentFormat::Pdf);
    content.total_pages = Some(pages.len() as u32);

    for page_number in pages.keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => {
                content.push_section(Section::new(cleanup_pdf_text(&text)).with_page(*page_number));
            }
            Err(e) => {
                tracing::debug!("Could not extract text from page {}: {}", page_number, e);
            }
        }
    }

    if content.sections.is_empty() {
        tracing::debug!("lopdf produced no text, falling back to pdf-extract");
        let text = pdf_extract::extract_text(path).map_err(|e| Error::file_parse("PDF", e))?;
        content.push_section(Section::new(cleanup_pdf_text(&text)));
    }

    if content.sections.is_empty() {
        return Err(Error::file_parse(
            "PDF",
            "No text content could be extracted from PDF (it may be image-based)",
        ));
    }

    Ok(content)
}

/// Replace ligatures and odd spacing, drop NULs and blank lines
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ") // Non-breaking space
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
