//! Built-in decoders, one module per [`DocumentFormat`](super::DocumentFormat)

pub mod docx;
pub mod html;
pub mod json;
pub mod markdown;
pub mod pdf;
pub mod presentation;
pub mod spreadsheet;
pub mod text;
