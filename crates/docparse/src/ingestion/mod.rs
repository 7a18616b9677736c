//! Upload ingestion: format registry, decoders and the parse pipeline

mod content;
mod decoder;
pub mod formats;
mod pipeline;
mod registry;

pub use content::{ParsedContent, Section, Table};
pub use decoder::{DocumentDecoder, NativeDecoder};
pub use pipeline::{ParsePipeline, UploadRequest};
pub use registry::{extension_of, DocumentFormat, ParserRegistry};
