//! Answer generation
//!
//! Wraps a causal language model behind the `CompletionModel` trait and
//! layers request capping, prompt-echo cleanup and a customer-facing
//! fallback on top of it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod candle;

// Re-exports
pub use candle::{CandleCausalGenerator, GeneratorConfig, ModelStage};

/// Friendly fallback used whenever generation cannot produce model text
pub const GENERATION_FALLBACK: &str =
    "I apologize, but I'm having trouble generating a response right now. Please try again later.";

/// Trait for causal completion models
///
/// `temperature <= 0` must decode greedily; positive values sample.
pub trait CompletionModel: Send + Sync {
    /// Produce a continuation of `prompt`
    fn complete(&self, prompt: &str, max_new_tokens: usize, temperature: f32) -> Result<String>;

    /// Model identifier (e.g. HuggingFace model ID)
    fn model_id(&self) -> &str;
}

/// Why a generation attempt produced no model text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFault {
    /// No language model was loaded at startup
    ModelUnavailable,
    /// The model failed mid-completion
    CompletionFailed(String),
}

impl std::fmt::Display for GenerationFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelUnavailable => write!(f, "language model unavailable"),
            Self::CompletionFailed(msg) => write!(f, "completion failed: {}", msg),
        }
    }
}

/// Outcome of a generation attempt
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Generated(String),
    Degraded(GenerationFault),
}

impl GenerationOutcome {
    /// Whether the fallback path was taken
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// Collapse to user-facing text: model output, or the fallback message
    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) => text,
            Self::Degraded(_) => GENERATION_FALLBACK.to_string(),
        }
    }
}

/// Configuration for the generation layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Hard ceiling on requested new tokens, whatever the caller asks for
    pub max_tokens_limit: usize,
    /// Used when a request does not specify max_tokens
    pub default_max_tokens: usize,
    /// Used when a request does not specify temperature
    pub default_temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens_limit: 500,
            default_max_tokens: 200,
            default_temperature: 0.7,
        }
    }
}

impl GenerationConfig {
    /// Set the hard ceiling on requested new tokens
    pub fn with_max_tokens_limit(mut self, limit: usize) -> Self {
        self.max_tokens_limit = limit;
        self
    }

    /// Set the default token budget for unspecified requests
    pub fn with_default_max_tokens(mut self, max_tokens: usize) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    /// Set the default sampling temperature
    pub fn with_default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = temperature;
        self
    }
}

/// A completion model plus the request-shaping rules around it
pub struct TextGenerator {
    /// None when no model could be loaded; every request then degrades
    model: Option<Arc<dyn CompletionModel>>,
    config: GenerationConfig,
}

impl TextGenerator {
    /// Wrap a loaded completion model
    pub fn new(model: Arc<dyn CompletionModel>, config: GenerationConfig) -> Self {
        Self {
            model: Some(model),
            config,
        }
    }

    /// A generator with no model; every request degrades to the fallback
    pub fn unavailable(config: GenerationConfig) -> Self {
        Self {
            model: None,
            config,
        }
    }

    /// Whether a model is actually loaded
    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Identifier of the loaded model, if any
    pub fn model_id(&self) -> Option<&str> {
        self.model.as_deref().map(|model| model.model_id())
    }

    /// The generation configuration in effect
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate text for `prompt`, capping `max_tokens` at the configured limit
    pub fn generate(&self, prompt: &str, max_tokens: usize, temperature: f32) -> GenerationOutcome {
        let Some(model) = &self.model else {
            return GenerationOutcome::Degraded(GenerationFault::ModelUnavailable);
        };

        let capped = max_tokens.min(self.config.max_tokens_limit);

        match model.complete(prompt, capped, temperature) {
            Ok(raw) => GenerationOutcome::Generated(strip_prompt_echo(raw, prompt)),
            Err(e) => {
                tracing::warn!("Generation failed: {}", e);
                GenerationOutcome::Degraded(GenerationFault::CompletionFailed(e.to_string()))
            }
        }
    }
}

/// Drop a leading copy of the prompt from model output
///
/// Pipelines that decode the whole sequence echo the prompt back; output
/// that does not start with the prompt passes through unchanged.
fn strip_prompt_echo(raw: String, prompt: &str) -> String {
    match raw.strip_prefix(prompt) {
        Some(rest) => rest.trim().to_string(),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Echoes the prompt then appends a fixed continuation
    struct EchoingModel;

    impl CompletionModel for EchoingModel {
        fn complete(&self, prompt: &str, _max: usize, _temp: f32) -> Result<String> {
            Ok(format!("{} The answer is yes.", prompt))
        }

        fn model_id(&self) -> &str {
            "echoing-stub"
        }
    }

    /// Records the arguments of the last completion request
    struct CapturingModel {
        last_max: Mutex<Option<usize>>,
        last_temp: Mutex<Option<f32>>,
    }

    impl CapturingModel {
        fn new() -> Self {
            Self {
                last_max: Mutex::new(None),
                last_temp: Mutex::new(None),
            }
        }
    }

    impl CompletionModel for CapturingModel {
        fn complete(&self, _prompt: &str, max_new_tokens: usize, temperature: f32) -> Result<String> {
            *self.last_max.lock().unwrap() = Some(max_new_tokens);
            *self.last_temp.lock().unwrap() = Some(temperature);
            Ok("ok".to_string())
        }

        fn model_id(&self) -> &str {
            "capturing-stub"
        }
    }

    struct FailingModel;

    impl CompletionModel for FailingModel {
        fn complete(&self, _prompt: &str, _max: usize, _temp: f32) -> Result<String> {
            anyhow::bail!("out of memory")
        }

        fn model_id(&self) -> &str {
            "failing-stub"
        }
    }

    #[test]
    fn test_strips_echoed_prompt() {
        let generator = TextGenerator::new(Arc::new(EchoingModel), GenerationConfig::default());

        let outcome = generator.generate("Why is the sky blue?", 50, 0.7);
        match outcome {
            GenerationOutcome::Generated(text) => assert_eq!(text, "The answer is yes."),
            GenerationOutcome::Degraded(fault) => panic!("unexpected degradation: {}", fault),
        }
    }

    #[test]
    fn test_non_echoing_output_passes_through() {
        struct PlainModel;
        impl CompletionModel for PlainModel {
            fn complete(&self, _p: &str, _m: usize, _t: f32) -> Result<String> {
                Ok("  indented answer".to_string())
            }
            fn model_id(&self) -> &str {
                "plain-stub"
            }
        }

        let generator = TextGenerator::new(Arc::new(PlainModel), GenerationConfig::default());
        match generator.generate("question", 50, 0.0) {
            GenerationOutcome::Generated(text) => assert_eq!(text, "  indented answer"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_caps_requested_tokens() {
        let model = Arc::new(CapturingModel::new());
        let generator = TextGenerator::new(model.clone(), GenerationConfig::default());

        generator.generate("hi", 10_000, 0.7);
        assert_eq!(*model.last_max.lock().unwrap(), Some(500));

        generator.generate("hi", 100, 0.2);
        assert_eq!(*model.last_max.lock().unwrap(), Some(100));
        assert_eq!(*model.last_temp.lock().unwrap(), Some(0.2));
    }

    #[test]
    fn test_model_failure_degrades_to_fallback() {
        let generator = TextGenerator::new(Arc::new(FailingModel), GenerationConfig::default());

        let outcome = generator.generate("hello", 50, 0.7);
        assert!(outcome.is_degraded());
        assert!(matches!(
            outcome,
            GenerationOutcome::Degraded(GenerationFault::CompletionFailed(_))
        ));
        assert_eq!(outcome.into_text(), GENERATION_FALLBACK);
    }

    #[test]
    fn test_unavailable_generator() {
        let generator = TextGenerator::unavailable(GenerationConfig::default());

        assert!(!generator.is_ready());
        assert_eq!(generator.model_id(), None);

        let outcome = generator.generate("hello", 50, 0.7);
        assert!(matches!(
            outcome,
            GenerationOutcome::Degraded(GenerationFault::ModelUnavailable)
        ));
        assert_eq!(outcome.into_text(), GENERATION_FALLBACK);
    }
}
