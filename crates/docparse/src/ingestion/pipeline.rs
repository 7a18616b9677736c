//! Upload-to-content pipeline
//!
//! `extension check -> stage -> decode -> release`. The scratch file is
//! released on every path out of the decode step, panics included.

use bytes::Bytes;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::content::ParsedContent;
use super::decoder::DocumentDecoder;
use super::registry::{extension_of, DocumentFormat, ParserRegistry};
use crate::error::{Error, Result};
use crate::scratch::ScratchSpace;

/// One uploaded file
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Client-supplied file name
    pub filename: String,
    /// Raw file contents
    pub data: Bytes,
}

impl UploadRequest {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Parses uploads with a shared registry, scratch space and decoder
#[derive(Clone)]
pub struct ParsePipeline {
    registry: Arc<ParserRegistry>,
    scratch: ScratchSpace,
    decoder: Arc<dyn DocumentDecoder>,
}

impl ParsePipeline {
    pub fn new(
        registry: Arc<ParserRegistry>,
        scratch: ScratchSpace,
        decoder: Arc<dyn DocumentDecoder>,
    ) -> Self {
        Self {
            registry,
            scratch,
            decoder,
        }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn scratch(&self) -> &ScratchSpace {
        &self.scratch
    }

    /// Extension and format for a file name, or an unsupported format error
    pub fn resolve(&self, filename: &str) -> Result<(String, DocumentFormat)> {
        let extension = extension_of(filename);
        match self.registry.lookup(&extension) {
            Some(format) => Ok((extension, format)),
            None => Err(Error::unsupported(
                extension,
                &self.registry.supported_extensions(),
            )),
        }
    }

    /// Run the whole pipeline on the current thread.
    ///
    /// Blocks on file I/O, decoding and deletion retries.
    pub fn run(&self, upload: &UploadRequest) -> Result<ParsedContent> {
        let (extension, format) = self.resolve(&upload.filename)?;
        let start = Instant::now();

        let staged = self.scratch.stage(&upload.data, &extension)?;
        let result = self.decode_guarded(format, staged.path());
        staged.release();

        match &result {
            Ok(content) => tracing::info!(
                "Parsed {} as {} ({} bytes, {} sections, {} tables) in {:.1}ms",
                upload.filename,
                format,
                upload.data.len(),
                content.sections.len(),
                content.tables.len(),
                start.elapsed().as_secs_f64() * 1000.0
            ),
            Err(e) => tracing::error!("Failed to parse {}: {}", upload.filename, e),
        }

        result
    }

    /// Run the pipeline on the blocking thread pool.
    ///
    /// Unsupported extensions are rejected before any blocking work starts.
    pub async fn process(&self, upload: UploadRequest) -> Result<ParsedContent> {
        self.resolve(&upload.filename)?;

        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.run(&upload))
            .await
            .map_err(|e| Error::processing(format!("Parse task failed: {}", e)))?
    }

    fn decode_guarded(&self, format: DocumentFormat, path: &Path) -> Result<ParsedContent> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(format, path))) {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(Error::Processing(message))) => Err(Error::Processing(message)),
            Ok(Err(other)) => Err(Error::processing(other.to_string())),
            Err(payload) => Err(Error::processing(format!(
                "{} decoder panicked: {}",
                format,
                panic_message(&*payload)
            ))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
