//! RAG (Retrieval-Augmented Generation) Pipeline
//!
//! This module wires retrieval and generation into the question-answering
//! flow behind `/chat`.
//!
//! # Architecture
//!
//! ```text
//! Customer Question
//!     │
//!     ▼
//! ┌─────────────┐
//! │  Retriever  │  ← Embeds the question, nearest-neighbor search,
//! └─────────────┘    distance cutoff
//!     │
//!     ▼ ranked documents (empty ⇒ no-match response, no generation)
//! ┌─────────────┐
//! │   Prompt    │  ← Joins contents into context, fills the
//! │  Assembly   │    support template
//! └─────────────┘
//!     │
//!     ▼ grounded prompt
//! ┌─────────────┐
//! │  Generator  │  ← Local causal LM (Qwen2)
//! └─────────────┘
//!     │
//!     ▼
//! RagResponse (answer + sources + confidence)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use shoplite_assistant::rag::{RagConfig, SupportPipeline};
//!
//! let pipeline = SupportPipeline::new(retriever, generator, RagConfig::default());
//!
//! let response = pipeline.answer("What payment methods do you accept?");
//! println!("{} ({})", response.answer, response.confidence);
//! ```

pub mod pipeline;
pub mod prompt;
pub mod response;

// Re-exports for convenience
pub use pipeline::{RagConfig, SupportPipeline};
pub use prompt::{build_context, render_prompt, SUPPORT_TEMPLATE};
pub use response::{
    Confidence, ConfidenceThresholds, RagResponse, NO_MATCH_ANSWER, PROCESSING_FALLBACK,
};
