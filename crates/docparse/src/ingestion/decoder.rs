//! Decoding capability invoked on staged files

use std::path::Path;

use super::content::ParsedContent;
use super::formats;
use super::registry::DocumentFormat;
use crate::error::Result;

/// Turns a file on disk into [`ParsedContent`]
pub trait DocumentDecoder: Send + Sync {
    /// Decode the file at `path` as `format`
    fn decode(&self, format: DocumentFormat, path: &Path) -> Result<ParsedContent>;
}

/// Decoder backed by the built-in format parsers
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDecoder;

impl DocumentDecoder for NativeDecoder {
    fn decode(&self, format: DocumentFormat, path: &Path) -> Result<ParsedContent> {
        format.decode(path)
    }
}

impl DocumentFormat {
    /// Decode a file with this format's parser
    pub fn decode(self, path: &Path) -> Result<ParsedContent> {
        match self {
            DocumentFormat::Pdf => formats::pdf::decode(path),
            DocumentFormat::Docx => formats::docx::decode(path),
            DocumentFormat::Spreadsheet => formats::spreadsheet::decode(path),
            DocumentFormat::Presentation => formats::presentation::decode(path),
            DocumentFormat::Html => formats::html::decode(path),
            DocumentFormat::Json => formats::json::decode(path),
            DocumentFormat::Markdown => formats::markdown::decode(path),
            DocumentFormat::Text => formats::text::decode(path),
        }
    }
}
