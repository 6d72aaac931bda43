//! # Shoplite Assistant
//!
//! A customer-support assistant for the Shoplite storefront: retrieval-
//! augmented answers over a built-in knowledge base, served by local
//! model inference.
//!
//! ## Overview
//!
//! The assistant answers customer questions in two steps. Retrieval embeds
//! the question and finds the closest support documents by exact
//! nearest-neighbor search; generation feeds them to a local causal LM
//! through a grounded prompt. Answer confidence is graded from the best
//! retrieval distance. Everything runs in-process with candle, including
//! the MiniLM embedder and the Qwen2 completion model.
//!
//! ## Architecture
//!
//! - `kb` - The built-in support document catalog
//! - `model` - Device selection, hub downloads, and tokenization
//! - `embedding` - Embedding backends (candle BERT plus hash-based stubs)
//! - `retrieval` - Flat vector index and the retriever
//! - `generation` - Completion models and the text generator
//! - `rag` - The support pipeline over retrieval and generation
//! - `assistant` - Startup assembly and service health
//! - `server` - Axum-based REST API

pub mod kb;
pub mod model;
pub mod embedding;
pub mod retrieval;
pub mod generation;
pub mod rag;
pub mod assistant;
pub mod server;

// Re-export commonly used types
pub use anyhow::{Error, Result};
