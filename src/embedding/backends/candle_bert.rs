//! Candle BERT backend for sentence embeddings
//!
//! Runs a BERT-family encoder (MiniLM by default) with masked mean pooling
//! over the last hidden states, matching sentence-transformers semantics.

use anyhow::{Context, Result};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};

use crate::embedding::{Embedder, Embedding, EmbeddingConfig};
use crate::model::hub::ModelLoader;
use crate::model::tokenizer::TokenizerWrapper;

/// BERT model configured for generating sentence embeddings
pub struct CandleBertEmbedder {
    model: BertModel,
    tokenizer: TokenizerWrapper,
    config: EmbeddingConfig,
    dimension: usize,
    device: Device,
}

impl CandleBertEmbedder {
    /// Load the model named in the config from HuggingFace Hub or a local path
    pub fn load(config: EmbeddingConfig, device: Device) -> Result<Self> {
        tracing::info!("Loading embedding model: {}", config.model_name);

        let loader = ModelLoader::new()?;
        let model_path = loader.load_model_path(&config.model_name)?;
        model_path.validate()?;

        let bert_config: BertConfig = model_path.load_config()?;

        tracing::debug!(
            "BERT config: hidden_size={}, layers={}, heads={}",
            bert_config.hidden_size,
            bert_config.num_hidden_layers,
            bert_config.num_attention_heads
        );

        // Load weights
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&model_path.weights_file], DType::F32, &device)
                .context("Failed to load safetensors weights")?
        };

        // Create model
        let model = BertModel::load(vb, &bert_config)
            .context("Failed to initialize BERT model from weights")?;

        let tokenizer =
            TokenizerWrapper::from_model_path(&model_path)?.with_max_length(config.max_length);

        tracing::info!(
            "Embedding model loaded: {} layers, dim={}",
            bert_config.num_hidden_layers,
            bert_config.hidden_size
        );

        Ok(Self {
            dimension: bert_config.hidden_size,
            model,
            tokenizer,
            config,
            device,
        })
    }

    /// Encode one text and mean-pool the token states into a sentence vector
    fn embed_one(&self, text: &str) -> Result<Embedding> {
        let encoded = self.tokenizer.encode(text, true)?;
        let (input_ids, token_type_ids, attention_mask) = encoded.to_tensors(&self.device)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mask-weighted mean over the sequence dimension: [1, T, H] -> [1, H]
        let mask = attention_mask.to_dtype(DType::F32)?;
        let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
        let lengths = mask.sum(1)?.unsqueeze(1)?;
        let mut pooled = summed.broadcast_div(&lengths)?;

        if self.config.normalize {
            let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
            pooled = pooled.broadcast_div(&norm.affine(1.0, 1e-12)?)?;
        }

        let embedding = pooled.squeeze(0)?.to_vec1::<f32>()?;
        Ok(embedding)
    }
}

impl Embedder for CandleBertEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        self.embed_one(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|&text| self.embed_one(text)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}
