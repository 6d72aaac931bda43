//! Model file resolution
//!
//! Maps a model identifier to its config/weights/tokenizer files on disk,
//! fetching from the HuggingFace Hub when the identifier is not a local
//! directory. Hub downloads land in the shared hub cache, so repeat loads
//! cost nothing.

use anyhow::{anyhow, Context, Result};
use hf_hub::api::sync::Api;
use std::path::{Path, PathBuf};

/// Resolved locations of one model's files
#[derive(Debug, Clone)]
pub struct ModelPath {
    /// config.json
    pub config_file: PathBuf,
    /// model.safetensors
    pub weights_file: PathBuf,
    /// tokenizer.json, when the model ships one
    pub tokenizer_file: Option<PathBuf>,
}

impl ModelPath {
    /// Resolve against a local model directory
    pub fn from_local(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(anyhow!("Model directory does not exist: {:?}", dir));
        }

        let resolved = Self {
            config_file: dir.join("config.json"),
            weights_file: dir.join("model.safetensors"),
            tokenizer_file: Some(dir.join("tokenizer.json")).filter(|p| p.exists()),
        };
        resolved.validate()?;
        Ok(resolved)
    }

    /// Read and parse config.json into a model-specific config type
    pub fn load_config<C: serde::de::DeserializeOwned>(&self) -> Result<C> {
        let content = std::fs::read_to_string(&self.config_file)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_file))?;
        serde_json::from_str(&content).context("Failed to parse config.json")
    }

    /// Check that the non-optional files are actually present
    pub fn validate(&self) -> Result<()> {
        for file in [&self.config_file, &self.weights_file] {
            if !file.exists() {
                return Err(anyhow!("Required model file not found: {:?}", file));
            }
        }
        Ok(())
    }
}

/// Resolves model identifiers, preferring local directories over the Hub
pub struct ModelLoader {
    api: Api,
}

impl ModelLoader {
    pub fn new() -> Result<Self> {
        let api = Api::new().context("Failed to initialize HuggingFace Hub API")?;
        Ok(Self { api })
    }

    /// Resolve a model identifier to its files
    ///
    /// Anything that exists on disk, or that looks like a filesystem path,
    /// is treated as local. Everything else is taken as a Hub repo id such
    /// as "sentence-transformers/all-MiniLM-L6-v2".
    pub fn load_model_path(&self, model_id_or_path: &str) -> Result<ModelPath> {
        let local = Path::new(model_id_or_path);
        let path_like = model_id_or_path.starts_with('.')
            || model_id_or_path.starts_with('/')
            || model_id_or_path.starts_with('~');

        if local.exists() {
            tracing::info!("Loading model from local path: {}", model_id_or_path);
            ModelPath::from_local(local)
        } else if path_like {
            Err(anyhow!(
                "Local model path does not exist: {}",
                model_id_or_path
            ))
        } else {
            self.fetch(model_id_or_path)
        }
    }

    /// Pull a model's files down from the HuggingFace Hub
    fn fetch(&self, model_id: &str) -> Result<ModelPath> {
        tracing::info!("Downloading model from HuggingFace Hub: {}", model_id);

        let repo = self.api.model(model_id.to_string());
        let config_file = repo
            .get("config.json")
            .context("Failed to download config.json")?;
        // safetensors only; candle memory-maps these directly
        let weights_file = repo
            .get("model.safetensors")
            .context("Failed to download model.safetensors")?;
        let tokenizer_file = repo.get("tokenizer.json").ok();

        tracing::debug!("Model files cached under {:?}", config_file.parent());

        Ok(ModelPath {
            config_file,
            weights_file,
            tokenizer_file,
        })
    }
}
