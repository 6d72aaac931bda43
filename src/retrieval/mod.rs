//! Document retrieval
//!
//! Embeds the knowledge base into a flat vector index and answers queries
//! with exact nearest-neighbor search plus distance filtering.

use crate::embedding::Embedder;
use crate::kb::Document;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod index;

// Re-exports
pub use index::{FlatIndex, Neighbor};

/// A retrieved document with its relevance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// The document content and metadata
    pub document: Document,
    /// Squared L2 distance from the query (lower is closer)
    pub distance: f32,
    /// Rank in the result list (1-indexed)
    pub rank: usize,
}

/// Ranked retrieval output, closest document first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredDocument>,
}

impl RetrievalResult {
    /// Number of retrieved documents
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Check if nothing was retrieved
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Distance of the best hit
    pub fn min_distance(&self) -> Option<f32> {
        self.hits.first().map(|hit| hit.distance)
    }

    /// Document contents in rank order
    pub fn contents(&self) -> Vec<&str> {
        self.hits
            .iter()
            .map(|hit| hit.document.content.as_str())
            .collect()
    }

    /// Document titles in rank order
    pub fn titles(&self) -> Vec<&str> {
        self.hits
            .iter()
            .map(|hit| hit.document.title.as_str())
            .collect()
    }
}

/// Why a retrieval attempt produced no ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalFault {
    /// No embedding backend was loaded at startup
    EmbedderUnavailable,
    /// The backend refused or failed to embed the query
    EmbedFailed(String),
}

impl std::fmt::Display for RetrievalFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmbedderUnavailable => write!(f, "embedding backend unavailable"),
            Self::EmbedFailed(msg) => write!(f, "query embedding failed: {}", msg),
        }
    }
}

/// Outcome of a retrieval attempt
///
/// `Ranked` carries the (possibly empty) distance-filtered ranking;
/// `Degraded` means the embedding stage itself was unable to run.
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    Ranked(RetrievalResult),
    Degraded(RetrievalFault),
}

impl RetrievalOutcome {
    /// The ranking, if retrieval ran at all
    pub fn ranking(&self) -> Option<&RetrievalResult> {
        match self {
            Self::Ranked(result) => Some(result),
            Self::Degraded(_) => None,
        }
    }
}

/// Configuration for the retriever
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Number of nearest documents to consider
    pub top_k: usize,
    /// Keep only hits within this squared L2 distance (inclusive)
    pub max_distance: f32,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            max_distance: 1.5,
        }
    }
}

impl RetrieverConfig {
    /// Set the number of documents to consider
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the distance cutoff
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }
}

/// Embeds queries and searches the document index
pub struct Retriever {
    /// None when no backend could be loaded; every query then degrades
    embedder: Option<Arc<dyn Embedder>>,
    index: FlatIndex,
    /// Same order as the index, so neighbor indices resolve directly
    documents: Vec<Document>,
    config: RetrieverConfig,
}

impl Retriever {
    /// Build the index by embedding every document up front
    pub fn build(
        documents: Vec<Document>,
        embedder: Arc<dyn Embedder>,
        config: RetrieverConfig,
    ) -> Result<Self> {
        let contents: Vec<&str> = documents.iter().map(|doc| doc.content.as_str()).collect();
        let embeddings = embedder.embed_batch(&contents)?;

        let mut index = FlatIndex::new();
        index.add(embeddings)?;

        tracing::info!(
            "Indexed {} documents ({:?}-dim embeddings)",
            documents.len(),
            index.dimension()
        );

        Ok(Self {
            embedder: Some(embedder),
            index,
            documents,
            config,
        })
    }

    /// A retriever with no embedding backend; every query degrades
    pub fn unavailable(documents: Vec<Document>, config: RetrieverConfig) -> Self {
        Self {
            embedder: None,
            index: FlatIndex::new(),
            documents,
            config,
        }
    }

    /// Whether queries can actually be embedded and searched
    pub fn is_ready(&self) -> bool {
        self.embedder.is_some()
    }

    /// Number of documents behind the index
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Retrieve with the configured top_k and distance cutoff
    pub fn retrieve(&self, query: &str) -> RetrievalOutcome {
        self.retrieve_with(query, self.config.top_k, self.config.max_distance)
    }

    /// Retrieve with explicit parameters
    pub fn retrieve_with(&self, query: &str, top_k: usize, max_distance: f32) -> RetrievalOutcome {
        let Some(embedder) = &self.embedder else {
            return RetrievalOutcome::Degraded(RetrievalFault::EmbedderUnavailable);
        };

        let query_embedding = match embedder.embed(query) {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!("Query embedding failed: {}", e);
                return RetrievalOutcome::Degraded(RetrievalFault::EmbedFailed(e.to_string()));
            }
        };

        let hits = self
            .index
            .search(&query_embedding, top_k)
            .into_iter()
            .filter(|neighbor| neighbor.distance <= max_distance)
            .enumerate()
            .map(|(rank, neighbor)| ScoredDocument {
                document: self.documents[neighbor.index].clone(),
                distance: neighbor.distance,
                rank: rank + 1,
            })
            .collect();

        RetrievalOutcome::Ranked(RetrievalResult { hits })
    }
}
