//! JSON decoding
//!
//! Documents are split into chunks that each serialize to at most
//! [`MAX_CHUNK_CHARS`] characters, key paths included. Every chunk keeps the
//! full key path of the values it holds, and arrays are turned into objects
//! keyed by index so the path stays addressable. A single leaf value that is
//! larger than the bound together with its path gets a chunk of its own and
//! is the only case where a chunk exceeds it.

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Error, Result};
use crate::ingestion::content::{ParsedContent, Section};
use crate::ingestion::registry::DocumentFormat;

/// Upper bound on a chunk's serialized length
pub const MAX_CHUNK_CHARS: usize = 2000;

pub fn decode(path: &Path) -> Result<ParsedContent> {
    let raw = std::fs::read(path)?;
    let value: Value = serde_json::from_slice(&raw).map_err(|e| Error::file_parse("JSON", e))?;

    let mut content = ParsedContent::new(DocumentFormat::Json);
    for (index, chunk) in JsonSplitter::new(MAX_CHUNK_CHARS).split(value).iter().enumerate() {
        let text = serde_json::to_string(chunk).map_err(|e| Error::internal(e.to_string()))?;
        content.push_section(Section::labeled(text, format!("chunk {}", index + 1)));
    }

    Ok(content)
}

/// Splits a JSON value into size-bounded objects
#[derive(Debug, Clone, Copy)]
pub struct JsonSplitter {
    max_chars: usize,
    min_chars: usize,
}

impl JsonSplitter {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            min_chars: max_chars.saturating_sub(200).max(50),
        }
    }

    pub fn split(&self, value: Value) -> Vec<Value> {
        match lists_to_maps(value) {
            Value::Object(map) => {
                let mut chunks = vec![Map::new()];
                let mut path = Vec::new();
                self.split_object(map, &mut path, &mut chunks);
                chunks.into_iter().map(Value::Object).collect()
            }
            scalar => vec![scalar],
        }
    }

    fn split_object(
        &self,
        map: Map<String, Value>,
        path: &mut Vec<String>,
        chunks: &mut Vec<Map<String, Value>>,
    ) {
        for (key, value) in map {
            path.push(key);

            let chunk = last_chunk(chunks);
            let chunk_size = serialized_len(chunk);
            if fits(chunk, chunk_size, path, &value, self.max_chars) {
                set_nested(chunk, path, value);
            } else {
                match value {
                    Value::Object(inner) if !inner.is_empty() => {
                        if chunk_size >= self.min_chars {
                            chunks.push(Map::new());
                        }
                        self.split_object(inner, path, chunks);
                    }
                    leaf => {
                        if !chunk.is_empty() {
                            chunks.push(Map::new());
                        }
                        set_nested(last_chunk(chunks), path, leaf);
                    }
                }
            }

            path.pop();
        }
    }
}

/// Whether `value` at `path` can join `chunk` without exceeding `max_chars`
fn fits(
    chunk: &Map<String, Value>,
    chunk_size: usize,
    path: &[String],
    value: &Value,
    max_chars: usize,
) -> bool {
    if chunk_size + value.to_string().chars().count() > max_chars {
        return false;
    }
    let mut candidate = chunk.clone();
    set_nested(&mut candidate, path, value.clone());
    serialized_len(&candidate) <= max_chars
}

fn last_chunk(chunks: &mut Vec<Map<String, Value>>) -> &mut Map<String, Value> {
    if chunks.is_empty() {
        chunks.push(Map::new());
    }
    let last = chunks.len() - 1;
    &mut chunks[last]
}

fn serialized_len(map: &Map<String, Value>) -> usize {
    serde_json::to_string(map).map(|s| s.chars().count()).unwrap_or(0)
}

fn lists_to_maps(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), lists_to_maps(v)))
                .collect(),
        ),
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, lists_to_maps(v))).collect())
        }
        other => other,
    }
}

fn set_nested(root: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut node = root;
    for key in parents {
        let entry = node
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        node = next;
    }
    node.insert(last.clone(), value);
}
