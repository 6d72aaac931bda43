//! Support pipeline orchestration
//!
//! Coordinates retrieval, prompt assembly and generation for answering
//! customer questions. The answer flow is total: degraded retrieval and
//! degraded generation both fold into well-formed responses.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::generation::TextGenerator;
use crate::retrieval::{RetrievalOutcome, Retriever};

use super::prompt::{build_context, render_prompt};
use super::response::{Confidence, ConfidenceThresholds, RagResponse};

/// Configuration for the support pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Token budget for generated answers
    pub answer_max_tokens: usize,

    /// Sampling temperature for answers
    pub answer_temperature: f32,

    /// Distance cutoffs for the confidence grade
    pub confidence: ConfidenceThresholds,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            answer_max_tokens: 150,
            answer_temperature: 0.3,
            confidence: ConfidenceThresholds::default(),
        }
    }
}

impl RagConfig {
    /// Set the answer token budget
    pub fn with_answer_max_tokens(mut self, max_tokens: usize) -> Self {
        self.answer_max_tokens = max_tokens;
        self
    }

    /// Set the answer sampling temperature
    pub fn with_answer_temperature(mut self, temperature: f32) -> Self {
        self.answer_temperature = temperature;
        self
    }

    /// Set the confidence tier cutoffs
    pub fn with_confidence(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.confidence = thresholds;
        self
    }
}

/// Retrieval-augmented answer pipeline
///
/// Orchestrates the full workflow:
/// 1. Retrieve the closest knowledge-base documents
/// 2. Assemble context and the grounded prompt
/// 3. Generate the answer
/// 4. Grade confidence from the best retrieval distance
pub struct SupportPipeline {
    retriever: Arc<Retriever>,
    generator: Arc<TextGenerator>,
    config: RagConfig,
}

impl SupportPipeline {
    /// Create a new pipeline
    pub fn new(retriever: Arc<Retriever>, generator: Arc<TextGenerator>, config: RagConfig) -> Self {
        Self {
            retriever,
            generator,
            config,
        }
    }

    /// Answer a customer question
    ///
    /// Never fails. A question with no close documents (or with retrieval
    /// degraded) gets the no-match response without invoking the model;
    /// a generation failure keeps the real sources and confidence but
    /// swaps in the fallback answer text.
    pub fn answer(&self, question: &str) -> RagResponse {
        let retrieval_start = Instant::now();
        let outcome = self.retriever.retrieve(question);
        let retrieval_ms = retrieval_start.elapsed().as_millis();

        let ranking = match outcome {
            RetrievalOutcome::Ranked(ranking) => ranking,
            RetrievalOutcome::Degraded(fault) => {
                tracing::warn!("Retrieval degraded: {}", fault);
                return RagResponse::no_match();
            }
        };

        if ranking.is_empty() {
            tracing::debug!("No documents within the distance cutoff");
            return RagResponse::no_match();
        }

        let confidence = match ranking.min_distance() {
            Some(distance) => Confidence::from_min_distance(distance, &self.config.confidence),
            None => Confidence::Low,
        };

        let context = build_context(&ranking.contents());
        let prompt = render_prompt(&context, question);
        let sources: Vec<String> = ranking
            .titles()
            .into_iter()
            .map(|title| title.to_string())
            .collect();

        let generation_start = Instant::now();
        let generation = self.generator.generate(
            &prompt,
            self.config.answer_max_tokens,
            self.config.answer_temperature,
        );
        let generation_ms = generation_start.elapsed().as_millis();

        let answer = generation.into_text().trim().to_string();

        tracing::debug!(
            "Answered with {} sources, {} confidence (retrieval {}ms, generation {}ms)",
            sources.len(),
            confidence,
            retrieval_ms,
            generation_ms
        );

        RagResponse {
            answer,
            sources,
            confidence,
        }
    }

    /// The pipeline configuration in effect
    pub fn config(&self) -> &RagConfig {
        &self.config
    }
}
