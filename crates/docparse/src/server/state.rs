//! Application state for the parsing server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::DocParseConfig;
use crate::error::Result;
use crate::ingestion::{NativeDecoder, ParsePipeline, ParserRegistry};
use crate::scratch::ScratchSpace;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: DocParseConfig,
    /// Registry, scratch space and decoder
    pipeline: ParsePipeline,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state with the built-in decoders.
    ///
    /// Creates the scratch directory if it is missing.
    pub fn new(config: DocParseConfig) -> Result<Self> {
        let scratch = ScratchSpace::new(&config.scratch);
        scratch.ensure_dir()?;
        tracing::info!(
            "Scratch directory: {} ({} delete attempts, {:?} apart)",
            scratch.dir().display(),
            scratch.policy().max_attempts,
            scratch.policy().delay
        );

        let registry = Arc::new(ParserRegistry::new());
        tracing::info!("Registered {} file extensions", registry.len());

        let pipeline = ParsePipeline::new(registry, scratch, Arc::new(NativeDecoder));
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create state around an already assembled pipeline
    pub fn with_pipeline(config: DocParseConfig, pipeline: ParsePipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                ready: RwLock::new(true),
            }),
        }
    }

    pub fn config(&self) -> &DocParseConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &ParsePipeline {
        &self.inner.pipeline
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
