//! Candle-based causal generator
//!
//! Runs Qwen2-family decoder models via the Candle ML framework, with
//! KV-cache incremental decoding and a two-stage load that can fall back
//! to a smaller model.

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::qwen2::{Config as Qwen2Config, ModelForCausalLM as Qwen2Model};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::CompletionModel;
use crate::model::device::{select_device, DevicePreference};
use crate::model::hub::ModelLoader;
use crate::model::tokenizer::TokenizerWrapper;

/// Which configured model ended up serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStage {
    Primary,
    Fallback,
}

impl std::fmt::Display for ModelStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Configuration for the causal generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// HuggingFace model ID or local path
    pub model_id: String,

    /// Smaller model to try when the primary fails to load
    pub fallback_model_id: Option<String>,

    /// Device preference (auto, cuda, metal, cpu)
    pub device: DevicePreference,

    /// Model data type ("f32", "f16", "bf16")
    pub dtype: String,

    /// Prompts longer than this many tokens are truncated, keeping the head
    pub max_input_tokens: usize,

    /// Sampling seed
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model_id: "Qwen/Qwen2.5-1.5B-Instruct".to_string(),
            fallback_model_id: Some("Qwen/Qwen2.5-0.5B-Instruct".to_string()),
            device: DevicePreference::Auto,
            dtype: "f32".to_string(),
            max_input_tokens: 1024,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator config with the given model ID
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            ..Default::default()
        }
    }

    /// Set the fallback model
    pub fn with_fallback(mut self, model_id: &str) -> Self {
        self.fallback_model_id = Some(model_id.to_string());
        self
    }

    /// Disable the fallback stage
    pub fn without_fallback(mut self) -> Self {
        self.fallback_model_id = None;
        self
    }

    /// Set the device preference
    pub fn with_device(mut self, device: DevicePreference) -> Self {
        self.device = device;
        self
    }

    /// Set the data type
    pub fn with_dtype(mut self, dtype: &str) -> Self {
        self.dtype = dtype.to_string();
        self
    }

    /// Set the input truncation budget
    pub fn with_max_input_tokens(mut self, max_input_tokens: usize) -> Self {
        self.max_input_tokens = max_input_tokens;
        self
    }
}

/// Candle-backed Qwen2 text generator
///
/// The model sits behind a Mutex because forward passes mutate the KV
/// cache; a completion holds the lock end to end so concurrent requests
/// cannot interleave cache state.
pub struct CandleCausalGenerator {
    model: Mutex<Qwen2Model>,
    tokenizer: TokenizerWrapper,
    model_id: String,
    stage: ModelStage,
    device: Device,
    eos_token_ids: Vec<u32>,
    seed: u64,
}

impl CandleCausalGenerator {
    /// Load the configured model, trying the fallback if the primary fails
    pub fn load_with_fallback(config: &GeneratorConfig) -> Result<Self> {
        let device = select_device(config.device)?;

        match Self::load_stage(&config.model_id, ModelStage::Primary, config, &device) {
            Ok(generator) => Ok(generator),
            Err(primary_err) => {
                let Some(fallback_id) = &config.fallback_model_id else {
                    return Err(primary_err);
                };
                tracing::warn!(
                    "Failed to load primary model {}: {:#}",
                    config.model_id,
                    primary_err
                );
                tracing::info!("Trying fallback model: {}", fallback_id);
                Self::load_stage(fallback_id, ModelStage::Fallback, config, &device)
            }
        }
    }

    fn load_stage(
        model_id: &str,
        stage: ModelStage,
        config: &GeneratorConfig,
        device: &Device,
    ) -> Result<Self> {
        tracing::info!("Loading generator model: {} ({})", model_id, stage);

        let loader = ModelLoader::new()?;
        let model_path = loader.load_model_path(model_id)?;
        let qwen_config: Qwen2Config = model_path.load_config()?;

        tracing::info!(
            "Loading Qwen2: vocab={}, hidden={}, layers={}",
            qwen_config.vocab_size,
            qwen_config.hidden_size,
            qwen_config.num_hidden_layers
        );

        let dtype = match config.dtype.as_str() {
            "f16" => DType::F16,
            "bf16" => DType::BF16,
            _ => DType::F32,
        };

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&model_path.weights_file], dtype, device)
                .context("Failed to load model weights")?
        };

        let model = Qwen2Model::new(&qwen_config, vb).context("Failed to create Qwen2 model")?;

        let tokenizer =
            TokenizerWrapper::from_model_path(&model_path)?.with_max_length(config.max_input_tokens);

        let mut eos_token_ids: Vec<u32> = ["<|im_end|>", "<|endoftext|>"]
            .iter()
            .filter_map(|token| tokenizer.token_to_id(token))
            .collect();
        if eos_token_ids.is_empty() {
            // Qwen2 <|endoftext|>
            eos_token_ids.push(151643);
        }

        tracing::info!("Generator loaded successfully ({})", stage);

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            model_id: model_id.to_string(),
            stage,
            device: device.clone(),
            eos_token_ids,
            seed: config.seed,
        })
    }

    /// Which load stage produced this generator
    pub fn stage(&self) -> ModelStage {
        self.stage
    }

    /// The device the model runs on
    pub fn device(&self) -> &Device {
        &self.device
    }

    fn complete_internal(
        &self,
        prompt: &str,
        max_new_tokens: usize,
        temperature: f32,
    ) -> Result<String> {
        // Encode prompt; the tokenizer truncates over-long input
        let encoded = self.tokenizer.encode(prompt, true)?;
        let mut all_tokens = encoded.input_ids;
        let prompt_len = all_tokens.len();

        if prompt_len == 0 {
            anyhow::bail!("Empty prompt after tokenization");
        }

        // Non-positive temperature means greedy decoding
        let temperature = if temperature > 0.0 {
            Some(temperature as f64)
        } else {
            None
        };
        let mut logits_processor = LogitsProcessor::new(self.seed, temperature, None);

        // Hold the lock for the whole loop; the KV cache belongs to this
        // completion until it finishes.
        let mut model = self
            .model
            .lock()
            .map_err(|e| anyhow::anyhow!("Model lock poisoned: {}", e))?;
        model.clear_kv_cache();

        let mut pos = 0;
        for _ in 0..max_new_tokens {
            // Full prompt on the first pass, then one token at a time
            let context_size = if pos == 0 { all_tokens.len() } else { 1 };
            let start = all_tokens.len().saturating_sub(context_size);
            let input = Tensor::new(&all_tokens[start..], &self.device)?.unsqueeze(0)?;

            let logits = model.forward(&input, pos)?;

            // Logits for the last position only
            let logits = logits.squeeze(0)?;
            let logits = if logits.dims().len() > 1 {
                logits.get(logits.dim(0)? - 1)?
            } else {
                logits
            };

            let next_token = logits_processor.sample(&logits)?;
            all_tokens.push(next_token);
            pos += context_size;

            if self.eos_token_ids.contains(&next_token) {
                tracing::debug!("Generation stopped: EOS token");
                break;
            }
        }

        // Decode only the continuation
        let output = self.tokenizer.decode(&all_tokens[prompt_len..], true)?;
        Ok(output.trim().to_string())
    }
}

impl CompletionModel for CandleCausalGenerator {
    fn complete(&self, prompt: &str, max_new_tokens: usize, temperature: f32) -> Result<String> {
        self.complete_internal(prompt, max_new_tokens, temperature)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_config_defaults() {
        let config = GeneratorConfig::default();

        assert_eq!(config.model_id, "Qwen/Qwen2.5-1.5B-Instruct");
        assert_eq!(
            config.fallback_model_id.as_deref(),
            Some("Qwen/Qwen2.5-0.5B-Instruct")
        );
        assert_eq!(config.max_input_tokens, 1024);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_generator_config_builder() {
        let config = GeneratorConfig::new("custom-model")
            .with_device(DevicePreference::Cpu)
            .with_max_input_tokens(2048)
            .without_fallback();

        assert_eq!(config.model_id, "custom-model");
        assert_eq!(config.device, DevicePreference::Cpu);
        assert_eq!(config.max_input_tokens, 2048);
        assert!(config.fallback_model_id.is_none());
    }

    #[test]
    fn test_model_stage_display() {
        assert_eq!(ModelStage::Primary.to_string(), "primary");
        assert_eq!(ModelStage::Fallback.to_string(), "fallback");
    }
}
