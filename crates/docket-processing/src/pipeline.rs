//! Content pipeline: extraction followed by embedding

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::embedding::{EmbeddingInput, EmbeddingProvider};
use crate::extract::{ExtractedText, TextExtractor};

/// Content pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The bytes hold no usable text (empty, unsupported format, unparsable PDF)
    #[error("Unprocessable content: {0}")]
    Unprocessable(String),

    /// The embedding provider failed or returned an unusable response
    #[error("Embedding failed: {0}")]
    Embedding(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Extraction and embedding behind one seam so the orchestrator can swap it in tests.
#[async_trait]
pub trait ContentPipeline: Send + Sync {
    async fn extract_text(&self, data: Bytes) -> PipelineResult<ExtractedText>;

    /// Embed document text for indexing.
    async fn embed(&self, text: &str) -> PipelineResult<Vec<f32>>;

    /// Embed a search query.
    async fn embed_query(&self, query: &str) -> PipelineResult<Vec<f32>>;

    fn model_name(&self) -> &str;
}

/// Pipeline composed from a text extractor and an embedding provider
#[derive(Clone)]
pub struct DefaultPipeline {
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl DefaultPipeline {
    pub fn new(extractor: Arc<dyn TextExtractor>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            extractor,
            embedder,
        }
    }

    async fn embed_checked(&self, text: &str, input: EmbeddingInput) -> PipelineResult<Vec<f32>> {
        let vector = self.embedder.embed(text, input).await?;
        if vector.len() != self.embedder.dimension() {
            return Err(PipelineError::Embedding(format!(
                "Embedding has {} dimensions, expected {}",
                vector.len(),
                self.embedder.dimension()
            )));
        }
        Ok(vector)
    }
}

#[async_trait]
impl ContentPipeline for DefaultPipeline {
    async fn extract_text(&self, data: Bytes) -> PipelineResult<ExtractedText> {
        self.extractor.extract(data).await
    }

    async fn embed(&self, text: &str) -> PipelineResult<Vec<f32>> {
        self.embed_checked(text, EmbeddingInput::Document).await
    }

    async fn embed_query(&self, query: &str) -> PipelineResult<Vec<f32>> {
        self.embed_checked(query, EmbeddingInput::Query).await
    }

    fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}
