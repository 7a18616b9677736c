//! Excel workbook decoding (.xlsx and legacy .xls)
//!
//! `calamine` picks the reader from the path suffix, which is why scratch
//! files keep the upload's extension.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::ingestion::content::{ParsedContent, Section, Table};
use crate::ingestion::registry::DocumentFormat;

pub fn decode(path: &Path) -> Result<ParsedContent> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| Error::file_parse("spreadsheet", e))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut content = ParsedContent::new(DocumentFormat::Spreadsheet);
    content.total_pages = Some(sheet_names.len() as u32);

    for (index, sheet_name) in sheet_names.iter().enumerate() {
        let range = match workbook.worksheet_range(sheet_name) {
            Ok(range) => range,
            Err(e) => {
                tracing::debug!("Skipping sheet '{}': {}", sheet_name, e);
                continue;
            }
        };

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();

        let page = index as u32 + 1;
        for line in row_lines(&rows) {
            content.push_section(Section::labeled(line, sheet_name.clone()).with_page(page));
        }
        content.push_table(Table::new(rows).with_caption(sheet_name.clone()));
    }

    Ok(content)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{:?}", e),
    }
}

/// Render data rows as `header: value` pairs, keyed by the first row.
///
/// A sheet with a single row yields that row joined by `; `.
fn row_lines(rows: &[Vec<String>]) -> Vec<String> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    if data.is_empty() {
        return vec![join_non_empty(header.iter().map(String::as_str))];
    }

    data.iter()
        .map(|row| {
            let pairs = row.iter().enumerate().filter(|(_, v)| !v.is_empty()).map(|(i, v)| {
                match header.get(i).filter(|h| !h.is_empty()) {
                    Some(h) => format!("{}: {}", h, v),
                    None => v.clone(),
                }
            });
            pairs.collect::<Vec<_>>().join("; ")
        })
        .filter(|line| !line.is_empty())
        .collect()
}

fn join_non_empty<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    cells.filter(|c| !c.is_empty()).collect::<Vec<_>>().join("; ")
}
