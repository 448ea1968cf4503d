//! Embedding providers
//!
//! `VoyageEmbedder` calls the Voyage AI embeddings API. `HashingEmbedder` is a deterministic
//! offline embedder (signed feature hashing over word tokens) used for development and tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docket_core::Config;
use serde::{Deserialize, Serialize};

use crate::pipeline::{PipelineError, PipelineResult};

const VOYAGE_API_BASE: &str = "https://api.voyageai.com/v1";

/// Voyage input limit is token based; this keeps requests well under it.
pub const MAX_EMBED_INPUT_CHARS: usize = 16_000;

/// What the text being embedded is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingInput {
    Document,
    Query,
}

impl EmbeddingInput {
    fn as_str(&self) -> &'static str {
        match self {
            EmbeddingInput::Document => "document",
            EmbeddingInput::Query => "query",
        }
    }
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model name stored alongside each index entry.
    fn model_name(&self) -> &str;

    /// Dimension of every returned vector.
    fn dimension(&self) -> usize;

    /// Embed `text`. Must return exactly `dimension()` values.
    async fn embed(&self, text: &str, input: EmbeddingInput) -> PipelineResult<Vec<f32>>;
}

/// Truncate or zero-pad an embedding to `dim` values.
pub fn normalize_embedding_dim(mut vec: Vec<f32>, dim: usize) -> Vec<f32> {
    if vec.len() > dim {
        vec.truncate(dim);
    } else if vec.len() < dim {
        vec.resize(dim, 0.0);
    }
    vec
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Serialize)]
struct VoyageEmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_type: Option<&'a str>, // "query" or "document"
}

#[derive(Debug, Deserialize)]
struct VoyageEmbedData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct VoyageEmbedResponse {
    data: Vec<VoyageEmbedData>,
}

/// Voyage AI embeddings over HTTP
#[derive(Clone)]
pub struct VoyageEmbedder {
    api_key: String,
    model: String,
    dimension: usize,
    base_url: String,
    client: reqwest::Client,
}

impl VoyageEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        dimension: usize,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self {
            api_key,
            model,
            dimension,
            base_url: VOYAGE_API_BASE.to_string(),
            client,
        })
    }

    /// Point at a different API base (e.g. a proxy)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingProvider for VoyageEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    #[tracing::instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str, input: EmbeddingInput) -> PipelineResult<Vec<f32>> {
        let start = std::time::Instant::now();
        let body = VoyageEmbedRequest {
            model: &self.model,
            input: vec![truncate_chars(text, MAX_EMBED_INPUT_CHARS)],
            input_type: Some(input.as_str()),
        };

        let response = self
            .client
            .post(self.embeddings_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Embedding(format!(
                    "Failed to send request to Voyage AI embeddings API: {}",
                    e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, "Voyage AI embeddings request failed");
            return Err(PipelineError::Embedding(format!(
                "Voyage AI embeddings failed with status {}: {}",
                status, error_text
            )));
        }

        let embed_response: VoyageEmbedResponse = response.json().await.map_err(|e| {
            PipelineError::Embedding(format!("Failed to parse Voyage AI response: {}", e))
        })?;

        let embedding = embed_response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Embedding("No embedding returned from Voyage AI".to_string()))?
            .embedding;

        tracing::debug!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            returned_dim = embedding.len(),
            "Voyage AI embedding generated"
        );

        Ok(normalize_embedding_dim(embedding, self.dimension))
    }
}

/// Deterministic offline embedder
///
/// Lowercased alphanumeric tokens are hashed (FNV-1a) into `dimension` buckets with a
/// hash-derived sign, then the vector is L2-normalized. Texts sharing words land close
/// together under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub const MODEL_NAME: &'static str = "hashing-v1";

    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn fnv1a(token: &str) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return vec;
        }

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = Self::fnv1a(&token.to_lowercase());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vec[bucket] += sign;
        }

        let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vec.iter_mut().for_each(|x| *x /= norm);
        }
        vec
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model_name(&self) -> &str {
        Self::MODEL_NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str, _input: EmbeddingInput) -> PipelineResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}

/// Create the embedding provider selected by `EMBEDDING_PROVIDER`
pub fn create_embedding_provider(config: &Config) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding_provider() {
        "voyage" => {
            let api_key = config
                .voyage_api_key()
                .ok_or_else(|| anyhow::anyhow!("VOYAGE_API_KEY must be set for the voyage provider"))?;
            let embedder = VoyageEmbedder::new(
                api_key.to_string(),
                config.voyage_embedding_model().to_string(),
                config.embedding_dim(),
                Duration::from_secs(config.embedding_timeout_secs()),
            )?;
            tracing::info!(
                model = %config.voyage_embedding_model(),
                dimension = config.embedding_dim(),
                "Voyage AI embedding provider configured"
            );
            Ok(Arc::new(embedder))
        }
        "hashing" => {
            tracing::info!(
                dimension = config.embedding_dim(),
                "Hashing embedding provider configured"
            );
            Ok(Arc::new(HashingEmbedder::new(config.embedding_dim())))
        }
        other => Err(anyhow::anyhow!("Unknown embedding provider: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_normalize_embedding_dim() {
        assert_eq!(normalize_embedding_dim(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
        assert_eq!(normalize_embedding_dim(vec![1.0], 3), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[tokio::test]
    async fn test_hashing_embedder_is_deterministic_and_unit_length() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder
            .embed("hello world", EmbeddingInput::Document)
            .await
            .unwrap();
        let b = embedder
            .embed("Hello, WORLD!", EmbeddingInput::Query)
            .await
            .unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_embedder_similar_texts_score_higher() {
        let embedder = HashingEmbedder::new(256);
        let query = embedder.embed_sync("quarterly revenue report");
        let related = embedder.embed_sync("the quarterly revenue grew");
        let unrelated = embedder.embed_sync("hiking trails near mountains");
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_hashing_embedder_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        assert!(embedder.embed_sync("  ").iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_voyage_unreachable_is_embedding_error() {
        let embedder = VoyageEmbedder::new(
            "key".to_string(),
            "voyage-3".to_string(),
            8,
            Duration::from_millis(500),
        )
        .unwrap()
        .with_base_url("http://127.0.0.1:9");

        let err = embedder
            .embed("text", EmbeddingInput::Document)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Embedding(_)));
    }
}
