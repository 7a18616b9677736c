//! docparse: upload a document, get its extracted content back
//!
//! A file's extension picks its decoder from a fixed [`ParserRegistry`]. The
//! upload is staged into a scratch file for the decoder to read, and that file
//! is deleted afterwards with retries on lock errors, whatever the outcome of
//! decoding.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod scratch;
pub mod server;
pub mod types;

pub use config::DocParseConfig;
pub use error::{Error, Result};
pub use ingestion::{
    DocumentDecoder, DocumentFormat, NativeDecoder, ParsePipeline, ParsedContent, ParserRegistry,
    UploadRequest,
};
pub use scratch::{ScratchFile, ScratchSpace};
pub use server::{build_router, state::AppState, ParseServer};
