//! HTML decoding

use scraper::{ElementRef, Html, Selector};
use std::path::Path;

use crate::error::{Error, Result};
use crate::ingestion::content::{ParsedContent, Section, Table};
use crate::ingestion::registry::DocumentFormat;

const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, pre, blockquote";

pub fn decode(path: &Path) -> Result<ParsedContent> {
    let raw = std::fs::read(path)?;
    let html = String::from_utf8_lossy(&raw);
    let document = Html::parse_document(&html);

    let mut content = ParsedContent::new(DocumentFormat::Html);

    let title = selector("title")?;
    content.title = document
        .select(&title)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty());

    let blocks = selector(BLOCK_SELECTOR)?;
    let nested_block = selector("p, pre")?;
    for element in document.select(&blocks) {
        if inside(&element, &["table", "head"]) {
            continue;
        }
        // List items and quotes holding paragraphs are covered by those paragraphs.
        let tag = element.value().name();
        if matches!(tag, "li" | "blockquote") && element.select(&nested_block).next().is_some() {
            continue;
        }
        content.push_section(Section::labeled(element_text(element), tag));
    }

    let tables = selector("table")?;
    let rows = selector("tr")?;
    let cells = selector("th, td")?;
    let caption = selector("caption")?;
    for table in document.select(&tables) {
        let parsed_rows: Vec<Vec<String>> = table
            .select(&rows)
            .map(|row| row.select(&cells).map(element_text).collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();

        let mut parsed = Table::new(parsed_rows);
        if let Some(caption) = table.select(&caption).next() {
            parsed = parsed.with_caption(element_text(caption));
        }
        content.push_table(parsed);
    }

    if content.is_empty() {
        let body = selector("body")?;
        if let Some(body) = document.select(&body).next() {
            content.push_section(Section::new(element_text(body)));
        }
    }

    Ok(content)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::internal(format!("Invalid selector '{}': {}", css, e)))
}

/// Element text with whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn inside(element: &ElementRef<'_>, tags: &[&str]) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| tags.contains(&e.name()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn decode_str(html: &str) -> ParsedContent {
        let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        file.write_all(html.as_bytes()).unwrap();
        decode(file.path()).unwrap()
    }

    #[test]
    fn test_blocks_and_title() {
        let content = decode_str(
            "<html><head><title> Release   notes </title></head><body>\
             <h1>Version 2</h1><p>Faster   startup.</p>\
             <ul><li>Fix A</li><li><p>Fix B</p></li></ul></body></html>",
        );

        assert_eq!(content.title.as_deref(), Some("Release notes"));
        let texts: Vec<_> = content.sections.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Version 2", "Faster startup.", "Fix A", "Fix B"]);
        assert_eq!(content.sections[0].label.as_deref(), Some("h1"));
    }

    #[test]
    fn test_tables_are_separate() {
        let content = decode_str(
            "<body><table><caption>Prices</caption>\
             <tr><th>Item</th><th>Cost</th></tr>\
             <tr><td><p>Tea</p></td><td>2</td></tr></table></body>",
        );

        assert!(content.sections.is_empty());
        assert_eq!(content.tables.len(), 1);
        assert_eq!(content.tables[0].caption.as_deref(), Some("Prices"));
        assert_eq!(
            content.tables[0].rows,
            vec![vec!["Item", "Cost"], vec!["Tea", "2"]]
        );
    }

    #[test]
    fn test_plain_body_falls_back_to_body_text() {
        let content = decode_str("<body>just <b>some</b> text</body>");
        assert_eq!(content.sections[0].text, "just some text");
    }
}
