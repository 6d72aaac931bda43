//! Embedding generation
//!
//! Provides a trait-based embedding interface with a candle BERT backend
//! plus deterministic model-free backends for tests and offline operation.

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod backends;

// Re-exports
pub use backends::{create_embedder, CandleBertEmbedder, MockEmbedder, TokenEmbedder};

/// Represents an embedding vector
pub type Embedding = Vec<f32>;

/// Configuration shared by the embedding backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name or path
    pub model_name: String,
    /// Whether to L2-normalize embeddings
    pub normalize: bool,
    /// Maximum sequence length in tokens
    pub max_length: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            normalize: true,
            max_length: 512,
        }
    }
}

impl EmbeddingConfig {
    /// Set the model name
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Set whether embeddings are L2-normalized
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set the maximum sequence length
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

/// Trait for embedding models
///
/// Implementations must preserve input order in `embed_batch` and emit the
/// same dimension for every text; the vector index depends on both.
pub trait Embedder: Send + Sync {
    /// Embed one text
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Embed many texts, one vector per input in the same order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Width of the produced vectors
    fn dimension(&self) -> usize;

    /// Name of the underlying model
    fn model_name(&self) -> &str;
}

/// Scale a vector to unit L2 norm, in place
///
/// The zero vector has no direction and is left untouched.
pub fn normalize_embedding(embedding: &mut Embedding) {
    let norm = embedding.iter().fold(0.0f32, |acc, x| acc + x * x).sqrt();

    if norm > 0.0 {
        embedding.iter_mut().for_each(|x| *x /= norm);
    }
}
