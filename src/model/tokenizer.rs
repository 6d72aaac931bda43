//! Tokenizer wrapper around the `tokenizers` crate
//!
//! Handles encoding with a hard length cap and turning encodings into
//! candle tensors. The cap keeps prompts within each model's context
//! window regardless of what callers send.

use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use std::path::Path;
use tokenizers::Tokenizer;

use crate::model::hub::{ModelLoader, ModelPath};

pub struct TokenizerWrapper {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl TokenizerWrapper {
    /// Load a tokenizer.json file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| anyhow!("Failed to read tokenizer from {:?}: {}", path.as_ref(), e))?;

        Ok(Self {
            tokenizer,
            max_length: 512,
        })
    }

    /// Load the tokenizer that ships with a resolved model
    pub fn from_model_path(model_path: &ModelPath) -> Result<Self> {
        let tokenizer_file = model_path
            .tokenizer_file
            .as_ref()
            .ok_or_else(|| anyhow!("Model has no tokenizer.json"))?;
        Self::from_file(tokenizer_file)
    }

    /// Resolve a model id or local path, then load its tokenizer
    pub fn from_pretrained(model_id_or_path: &str) -> Result<Self> {
        let model_path = ModelLoader::new()?.load_model_path(model_id_or_path)?;
        Self::from_model_path(&model_path)
    }

    /// Cap encodings at `max_length` tokens
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Encode text, keeping at most `max_length` tokens from the front
    pub fn encode(&self, text: &str, add_special_tokens: bool) -> Result<EncodedInput> {
        let encoding = self
            .tokenizer
            .encode(text, add_special_tokens)
            .map_err(|e| anyhow!("Encoding failed: {}", e))?;

        let mut input_ids = encoding.get_ids().to_vec();
        let mut token_type_ids = encoding.get_type_ids().to_vec();
        let mut attention_mask = encoding.get_attention_mask().to_vec();

        if input_ids.len() > self.max_length {
            tracing::debug!(
                "Truncating input from {} to {} tokens",
                input_ids.len(),
                self.max_length
            );
            for ids in [&mut input_ids, &mut token_type_ids, &mut attention_mask] {
                ids.truncate(self.max_length);
            }
        }

        Ok(EncodedInput {
            input_ids,
            token_type_ids,
            attention_mask,
        })
    }

    /// Turn token ids back into text
    pub fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        self.tokenizer
            .decode(ids, skip_special_tokens)
            .map_err(|e| anyhow!("Token decoding failed: {}", e))
    }

    /// Look up a single token's id, e.g. for EOS detection
    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.tokenizer.token_to_id(token)
    }
}

/// One encoded sequence, ready to become model input
#[derive(Debug, Clone)]
pub struct EncodedInput {
    pub input_ids: Vec<u32>,
    /// Segment markers, all zero outside sentence-pair tasks
    pub token_type_ids: Vec<u32>,
    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<u32>,
}

impl EncodedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Batch-of-one tensors on `device`: (input_ids, token_type_ids, attention_mask)
    pub fn to_tensors(&self, device: &Device) -> Result<(Tensor, Tensor, Tensor)> {
        let as_row = |values: &[u32]| -> Result<Tensor> {
            // U32 [seq] -> [1, seq]
            Ok(Tensor::new(values, device)?.unsqueeze(0)?)
        };

        Ok((
            as_row(&self.input_ids)?,
            as_row(&self.token_type_ids)?,
            as_row(&self.attention_mask)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Downloads from HuggingFace Hub
    fn test_load_from_hub() {
        let tokenizer = TokenizerWrapper::from_pretrained("bert-base-uncased");
        assert!(tokenizer.is_ok(), "load failed: {:?}", tokenizer.err());
    }

    #[test]
    #[ignore] // Downloads from HuggingFace Hub
    fn test_encode_respects_max_length() {
        let tokenizer = TokenizerWrapper::from_pretrained("bert-base-uncased")
            .unwrap()
            .with_max_length(8);

        let long_input = "where is my order ".repeat(20);
        let encoded = tokenizer.encode(&long_input, true).unwrap();

        assert_eq!(encoded.len(), 8);
        assert_eq!(encoded.input_ids.len(), encoded.attention_mask.len());
        assert!(!encoded.is_empty());
    }
}
