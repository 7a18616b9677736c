//! Response types for the parsing endpoints

use serde::Serialize;
use std::collections::BTreeMap;

use crate::ingestion::ParsedContent;
use crate::scratch::ScratchStatsSnapshot;

/// Body of a successful `POST /parse`
#[derive(Debug, Clone, Serialize)]
pub struct ParseResponse {
    /// Always `"success"`
    pub status: &'static str,
    /// Extracted document content
    pub content: ParsedContent,
}

impl ParseResponse {
    pub fn success(content: ParsedContent) -> Self {
        Self {
            status: "success",
            content,
        }
    }
}

/// Body of `GET /supported-formats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedFormatsResponse {
    pub supported_formats: Vec<String>,
}

/// Body of `GET /info`
#[derive(Debug, Clone, Serialize)]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    /// Route -> what it does
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub supported_formats: Vec<String>,
    /// Scratch file counters since startup
    pub scratch: ScratchStatsSnapshot,
}
