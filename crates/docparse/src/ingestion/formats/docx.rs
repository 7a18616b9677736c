//! Word document decoding

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table as DocxTable, TableCellContent,
    TableChild, TableRowChild,
};
use std::path::Path;

use crate::error::{Error, Result};
use crate::ingestion::content::{ParsedContent, Section, Table};
use crate::ingestion::registry::DocumentFormat;

pub fn decode(path: &Path) -> Result<ParsedContent> {
    let data = std::fs::read(path)?;
    let docx = docx_rs::read_docx(&data).map_err(|e| Error::file_parse("DOCX", e))?;

    let mut content = ParsedContent::new(DocumentFormat::Docx);

    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                let text = paragraph_text(paragraph);
                let section = match paragraph_style(paragraph) {
                    Some(style) => Section::labeled(text, style),
                    None => Section::new(text),
                };
                content.push_section(section);
            }
            DocumentChild::Table(table) => content.push_table(Table::new(table_rows(table))),
            _ => {}
        }
    }

    Ok(content)
}

fn paragraph_style(paragraph: &Paragraph) -> Option<String> {
    paragraph
        .property
        .style
        .as_ref()
        .map(|style| style.val.clone())
        .filter(|val| !val.is_empty())
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        collect_text(child, &mut text);
    }
    text
}

fn collect_text(child: &ParagraphChild, out: &mut String) {
    match child {
        ParagraphChild::Run(run) => {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => out.push_str(&t.text),
                    RunChild::Tab(_) => out.push('\t'),
                    RunChild::Break(_) => out.push('\n'),
                    _ => {}
                }
            }
        }
        ParagraphChild::Hyperlink(link) => {
            for link_child in &link.children {
                collect_text(link_child, out);
            }
        }
        _ => {}
    }
}

fn table_rows(table: &DocxTable) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for table_child in &table.rows {
        let TableChild::TableRow(row) = table_child else {
            continue;
        };
        let mut cells = Vec::new();

        for row_child in &row.cells {
            let TableRowChild::TableCell(cell) = row_child else {
                continue;
            };
            let text = cell
                .children
                .iter()
                .filter_map(|c| match c {
                    TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n");
            cells.push(text.trim().to_string());
        }

        if cells.iter().any(|c| !c.is_empty()) {
            rows.push(cells);
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_corrupted_docx_reports_decode_failure() {
        let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        file.write_all(b"PK\x03\x04 definitely not a word document").unwrap();

        let err = decode(file.path()).unwrap_err();
        assert!(matches!(err, Error::Processing(_)));
        assert!(err.to_string().starts_with("Failed to parse DOCX"));
    }
}
