//! Extracted document content

use serde::Serialize;

use super::registry::DocumentFormat;

/// Content decoded from one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedContent {
    /// Format the document was decoded as
    pub format: DocumentFormat,
    /// Document title (if present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Text sections in document order
    pub sections: Vec<Section>,
    /// Tables found in the document
    pub tables: Vec<Table>,
    /// Pages, slides or sheets (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// A run of text with an optional label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Text content
    pub text: String,
    /// Style, heading, tag or sheet name the text belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Page or slide number (1-indexed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// A table as rows of cell text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Caption or sheet name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Rows of cells, header row first when there is one
    pub rows: Vec<Vec<String>>,
}

impl ParsedContent {
    /// Empty content for a format
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            title: None,
            sections: Vec::new(),
            tables: Vec::new(),
            total_pages: None,
        }
    }

    /// Append a section, skipping blank text
    pub fn push_section(&mut self, section: Section) {
        if !section.text.trim().is_empty() {
            self.sections.push(section);
        }
    }

    /// Append a table, skipping tables without rows
    pub fn push_table(&mut self, table: Table) {
        if !table.rows.is_empty() {
            self.tables.push(table);
        }
    }

    /// All section text joined by blank lines
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.tables.is_empty()
    }
}

impl Section {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: None,
            page: None,
        }
    }

    pub fn labeled(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: Some(label.into()),
            page: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            caption: None,
            rows,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}
