//! Docket Content Pipeline
//!
//! Turns uploaded document bytes into indexable content: text extraction (PDF and
//! UTF-8 text), normalization, and embedding through a pluggable provider.

pub mod embedding;
pub mod extract;
pub mod pipeline;

pub use embedding::{
    create_embedding_provider, EmbeddingInput, EmbeddingProvider, HashingEmbedder,
    VoyageEmbedder,
};
pub use extract::{DocumentFormat, DocumentTextExtractor, ExtractedText, TextExtractor};
pub use pipeline::{ContentPipeline, DefaultPipeline, PipelineError, PipelineResult};
