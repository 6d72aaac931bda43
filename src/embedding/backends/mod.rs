//! Embedding backend implementations
//!
//! `CandleBertEmbedder` does real sentence embedding; `MockEmbedder` and
//! `TokenEmbedder` are deterministic stand-ins that need no model files,
//! keeping tests and offline runs independent of the Hub.

use crate::embedding::{normalize_embedding, Embedder, Embedding, EmbeddingConfig};
use anyhow::Result;
use candle_core::Device;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub mod candle_bert;

pub use candle_bert::CandleBertEmbedder;

/// Test embedder producing a fixed pseudo-random vector per input text
pub struct MockEmbedder {
    config: EmbeddingConfig,
    dimension: usize,
}

impl MockEmbedder {
    /// Create a new mock embedder
    pub fn new(config: EmbeddingConfig, dimension: usize) -> Self {
        Self { config, dimension }
    }

    fn generate_embedding(&self, text: &str) -> Embedding {
        // Each component hashes (text, position): stable for a given text,
        // uncorrelated across texts
        let mut embedding: Embedding = (0..self.dimension)
            .map(|position| {
                let mut hasher = DefaultHasher::new();
                text.hash(&mut hasher);
                position.hash(&mut hasher);
                (hasher.finish() % 1000) as f32 / 1000.0 - 0.5
            })
            .collect();

        if self.config.normalize {
            normalize_embedding(&mut embedding);
        }
        embedding
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts
            .iter()
            .map(|&text| self.generate_embedding(text))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// Hashing bag-of-tokens embedder
///
/// Model-free fallback: every token hashes to a slot and contributes its
/// term frequency. Crude, but texts with overlapping vocabulary land in
/// overlapping slots, which is enough to keep the service running when no
/// model can be loaded.
pub struct TokenEmbedder {
    config: EmbeddingConfig,
    dimension: usize,
}

impl TokenEmbedder {
    /// Create a new token-based embedder
    pub fn new(config: EmbeddingConfig, dimension: usize) -> Self {
        Self { config, dimension }
    }

    fn generate_embedding(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0; self.dimension];

        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(|token| token.to_lowercase())
            .collect();

        if tokens.is_empty() {
            return embedding;
        }

        let weight = 1.0 / tokens.len() as f32;
        for token in &tokens {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let slot = (hasher.finish() as usize) % self.dimension;
            embedding[slot] += weight;
        }

        if self.config.normalize {
            normalize_embedding(&mut embedding);
        }
        embedding
    }
}

impl Embedder for TokenEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts
            .iter()
            .map(|&text| self.generate_embedding(text))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// Create an embedder based on backend name
///
/// `dimension` applies to the model-free backends; the candle backend
/// reads its dimension from the model config instead.
pub fn create_embedder(
    backend: &str,
    config: EmbeddingConfig,
    dimension: usize,
    device: &Device,
) -> Result<Arc<dyn Embedder>> {
    match backend {
        "mock" => Ok(Arc::new(MockEmbedder::new(config, dimension))),
        "token" => Ok(Arc::new(TokenEmbedder::new(config, dimension))),
        "minilm" | "bert" => Ok(Arc::new(CandleBertEmbedder::load(config, device.clone())?)),
        _ => {
            tracing::warn!("Unknown backend '{}', using token-based embedder", backend);
            Ok(Arc::new(TokenEmbedder::new(config, dimension)))
        }
    }
}
