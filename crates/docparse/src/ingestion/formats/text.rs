//! Plain text decoding

use std::path::Path;

use crate::error::Result;
use crate::ingestion::content::{ParsedContent, Section};
use crate::ingestion::registry::DocumentFormat;

/// Approximate token budget per section, counted in whitespace words
pub const CHUNK_WORDS: usize = 128;

pub fn decode(path: &Path) -> Result<ParsedContent> {
    let raw = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&raw);

    let mut content = ParsedContent::new(DocumentFormat::Text);
    for chunk in chunk_text(&text, CHUNK_WORDS) {
        content.push_section(Section::new(chunk));
    }
    Ok(content)
}

/// Group blank-line separated paragraphs into chunks of at most `max_words`.
///
/// Paragraphs longer than the limit are cut at word boundaries.
pub fn chunk_text(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_words = 0;

    for paragraph in paragraphs(text) {
        let words: Vec<&str> = paragraph.split_whitespace().collect();

        if current_words + words.len() > max_words && !current.is_empty() {
            chunks.push(current.join("\n\n"));
            current.clear();
            current_words = 0;
        }

        if words.len() > max_words {
            let mut pieces = words.chunks(max_words).map(|w| w.join(" ")).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    current_words = piece.split_whitespace().count();
                    current.push(piece);
                }
            }
            continue;
        }

        current_words += words.len();
        current.push(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current.join("\n\n"));
    }

    chunks
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !lines.is_empty() {
                paragraphs.push(lines.join("\n"));
                lines.clear();
            }
        } else {
            lines.push(line.trim_end());
        }
    }
    if !lines.is_empty() {
        paragraphs.push(lines.join("\n"));
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_short_paragraphs_share_a_chunk() {
        let chunks = chunk_text("first para\nstill first\n\n\nsecond para\n", CHUNK_WORDS);
        assert_eq!(chunks, vec!["first para\nstill first\n\nsecond para"]);
    }

    #[test]
    fn test_chunks_break_at_word_limit() {
        let chunks = chunk_text("a b c\n\nd e\n\nf g h i j", 5);
        assert_eq!(chunks, vec!["a b c\n\nd e", "f g h i j"]);
    }

    #[test]
    fn test_long_paragraph_is_cut() {
        let chunks = chunk_text("one two three four five six seven\n\neight", 3);
        assert_eq!(chunks, vec!["one two three", "four five six", "seven\n\neight"]);
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"caf\xe9 menu\n").unwrap();

        let content = decode(file.path()).unwrap();
        assert_eq!(content.sections.len(), 1);
        assert_eq!(content.sections[0].text, "caf\u{FFFD} menu");
    }

    #[test]
    fn test_blank_file_has_no_sections() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(decode(file.path()).unwrap().is_empty());
    }
}
