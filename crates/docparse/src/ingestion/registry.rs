//! Extension-to-format dispatch table

use serde::{Deserialize, Serialize};

/// Document formats the service can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Excel workbook (.xlsx, .xls)
    Spreadsheet,
    /// PowerPoint presentation (.pptx, .ppt)
    Presentation,
    /// HTML document
    Html,
    /// JSON document
    Json,
    /// Markdown file
    Markdown,
    /// Plain text file
    Text,
}

impl DocumentFormat {
    /// Human readable name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Spreadsheet => "spreadsheet",
            DocumentFormat::Presentation => "presentation",
            DocumentFormat::Html => "HTML",
            DocumentFormat::Json => "JSON",
            DocumentFormat::Markdown => "Markdown",
            DocumentFormat::Text => "text",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Registered extensions, in listing order
const BUILTIN_FORMATS: &[(&str, DocumentFormat)] = &[
    (".pdf", DocumentFormat::Pdf),
    (".docx", DocumentFormat::Docx),
    (".xlsx", DocumentFormat::Spreadsheet),
    (".xls", DocumentFormat::Spreadsheet),
    (".pptx", DocumentFormat::Presentation),
    (".ppt", DocumentFormat::Presentation),
    (".html", DocumentFormat::Html),
    (".json", DocumentFormat::Json),
    (".md", DocumentFormat::Markdown),
    (".txt", DocumentFormat::Text),
];

/// Immutable mapping from file extension to [`DocumentFormat`]
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    entries: &'static [(&'static str, DocumentFormat)],
}

impl ParserRegistry {
    /// Registry with every built-in format
    pub fn new() -> Self {
        Self {
            entries: BUILTIN_FORMATS,
        }
    }

    /// Find the format for an extension such as `.pdf`.
    ///
    /// Matching ignores ASCII case; the leading dot is required.
    pub fn lookup(&self, extension: &str) -> Option<DocumentFormat> {
        self.entries
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map(|(_, format)| *format)
    }

    /// All registered extensions, in a stable order
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(ext, _)| *ext).collect()
    }

    /// Number of registered extensions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower-cased extension of an uploaded file name, including the dot.
///
/// Only the last component of the name is considered, and only its final
/// suffix: `archive.tar.GZ` gives `.gz`. Names without a suffix, dot files
/// such as `.bashrc`, and names ending in a dot give an empty string.
pub fn extension_of(filename: &str) -> String {
    let name = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("");

    match name.rfind('.') {
        Some(idx) if idx > 0 && idx < name.len() - 1 => name[idx..].to_lowercase(),
        _ => String::new(),
    }
}
