//! Markdown decoding
//!
//! One section per heading, labeled with the heading text. Tables are pulled
//! out into [`Table`]s instead of being flattened into section text.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::path::Path;

use crate::error::Result;
use crate::ingestion::content::{ParsedContent, Section, Table};
use crate::ingestion::registry::DocumentFormat;

pub fn decode(path: &Path) -> Result<ParsedContent> {
    let raw = std::fs::read(path)?;
    Ok(decode_str(&String::from_utf8_lossy(&raw)))
}

fn decode_str(markdown: &str) -> ParsedContent {
    let mut walker = Walker::new();
    for event in Parser::new_ext(markdown, Options::ENABLE_TABLES) {
        walker.handle(event);
    }
    walker.finish()
}

struct Walker {
    content: ParsedContent,
    label: Option<String>,
    body: String,
    heading: Option<(HeadingLevel, String)>,
    table: Option<Vec<Vec<String>>>,
    row: Vec<String>,
    cell: Option<String>,
}

impl Walker {
    fn new() -> Self {
        Self {
            content: ParsedContent::new(DocumentFormat::Markdown),
            label: None,
            body: String::new(),
            heading: None,
            table: None,
            row: Vec::new(),
            cell: None,
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_section();
                self.heading = Some((level, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = self.heading.take() {
                    let text = text.trim().to_string();
                    if level == HeadingLevel::H1 && self.content.title.is_none() && !text.is_empty() {
                        self.content.title = Some(text.clone());
                    }
                    self.label = Some(text).filter(|t| !t.is_empty());
                }
            }
            Event::Start(Tag::Table(_)) => self.table = Some(Vec::new()),
            Event::End(TagEnd::Table) => {
                if let Some(rows) = self.table.take() {
                    self.content.push_table(Table::new(rows));
                }
            }
            Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => self.row.clear(),
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                let row = std::mem::take(&mut self.row);
                if let Some(rows) = self.table.as_mut() {
                    rows.push(row);
                }
            }
            Event::Start(Tag::TableCell) => self.cell = Some(String::new()),
            Event::End(TagEnd::TableCell) => {
                if let Some(cell) = self.cell.take() {
                    self.row.push(cell.trim().to_string());
                }
            }
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock)
            | Event::HardBreak => self.body.push('\n'),
            Event::SoftBreak => self.push_text(" "),
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.push_str(text);
        } else if let Some((_, heading)) = self.heading.as_mut() {
            heading.push_str(text);
        } else {
            self.body.push_str(text);
        }
    }

    fn flush_section(&mut self) {
        let text = self
            .body
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        self.body.clear();

        let section = match self.label.take() {
            Some(label) => Section::labeled(text, label),
            None => Section::new(text),
        };
        self.content.push_section(section);
    }

    fn finish(mut self) -> ParsedContent {
        self.flush_section();
        self.content
    }
}
