//! Assistant assembly and service status
//!
//! Builds every subsystem once at startup and owns them for the lifetime of
//! the process. Loading failures degrade the affected subsystem instead of
//! aborting: without an embedder every question takes the no-match path,
//! without a completion model every generation returns the fallback text.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::embedding::backends::create_embedder;
use crate::embedding::EmbeddingConfig;
use crate::generation::candle::{CandleCausalGenerator, GeneratorConfig, ModelStage};
use crate::generation::{GenerationConfig, TextGenerator};
use crate::kb::KnowledgeBase;
use crate::model::{device_label, select_device, DevicePreference};
use crate::rag::{RagConfig, RagResponse, SupportPipeline};
use crate::retrieval::{Retriever, RetrieverConfig};

pub const SERVICE_NAME: &str = "Shoplite AI Assistant";
pub const SERVICE_VERSION: &str = "2.0";

/// Top-level configuration for the assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Embedding backend name ("minilm", "token", "mock")
    pub embedding_backend: String,

    /// Vector width for the hash-based backends; model backends report
    /// their own dimension
    pub embedding_dimension: usize,

    pub embedding: EmbeddingConfig,
    pub generator: GeneratorConfig,
    pub generation: GenerationConfig,
    pub retriever: RetrieverConfig,
    pub rag: RagConfig,

    /// Device preference shared by the embedder and the completion model
    pub device: DevicePreference,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            embedding_backend: "minilm".to_string(),
            embedding_dimension: 384,
            embedding: EmbeddingConfig::default(),
            generator: GeneratorConfig::default(),
            generation: GenerationConfig::default(),
            retriever: RetrieverConfig::default(),
            rag: RagConfig::default(),
            device: DevicePreference::Auto,
        }
    }
}

/// Snapshot of service health, reported by `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// "healthy" when both retrieval and generation are up, else "degraded"
    pub status: String,
    /// Model actually serving completions, if one loaded
    pub llm_model: Option<String>,
    /// Whether the primary or the fallback model is active
    pub model_stage: Option<ModelStage>,
    pub device: String,
    pub rag_available: bool,
    pub knowledge_base_size: usize,
}

/// Service identity, reported by the root endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
    pub model: Option<String>,
    pub device: String,
    pub endpoints: Vec<String>,
    pub version: String,
}

/// The assembled assistant: retrieval, generation and the pipeline over both
pub struct Assistant {
    retriever: Arc<Retriever>,
    generator: Arc<TextGenerator>,
    pipeline: SupportPipeline,
    device: String,
    model_stage: Option<ModelStage>,
    knowledge_base_size: usize,
}

impl Assistant {
    /// Load every subsystem and assemble the pipeline
    ///
    /// Model loading happens here, once. Embedding or completion backends
    /// that fail to load are logged and left unavailable rather than
    /// failing startup.
    pub fn initialize(config: AssistantConfig) -> Result<Self> {
        let device = select_device(config.device)?;
        let device_name = device_label(&device).to_string();
        tracing::info!("Initializing assistant on {}", device_name);

        let kb = KnowledgeBase::builtin();
        let knowledge_base_size = kb.len();

        let retriever = match create_embedder(
            &config.embedding_backend,
            config.embedding.clone(),
            config.embedding_dimension,
            &device,
        ) {
            Ok(embedder) => match Retriever::build(
                kb.clone().into_documents(),
                embedder,
                config.retriever,
            ) {
                Ok(retriever) => Arc::new(retriever),
                Err(e) => {
                    tracing::warn!("Failed to index knowledge base: {:#}", e);
                    Arc::new(Retriever::unavailable(kb.into_documents(), config.retriever))
                }
            },
            Err(e) => {
                tracing::warn!("Failed to load embedding backend: {:#}", e);
                Arc::new(Retriever::unavailable(kb.into_documents(), config.retriever))
            }
        };

        // One device preference drives both model loads
        let generator_config = config.generator.clone().with_device(config.device);
        let (generator, model_stage, device_name) =
            match CandleCausalGenerator::load_with_fallback(&generator_config) {
                Ok(model) => {
                    let stage = model.stage();
                    // Health reports the device the loaded model runs on
                    let label = device_label(model.device()).to_string();
                    (
                        TextGenerator::new(Arc::new(model), config.generation.clone()),
                        Some(stage),
                        label,
                    )
                }
                Err(e) => {
                    tracing::warn!("No completion model available: {:#}", e);
                    (
                        TextGenerator::unavailable(config.generation.clone()),
                        None,
                        device_name,
                    )
                }
            };
        let generator = Arc::new(generator);

        let pipeline = SupportPipeline::new(retriever.clone(), generator.clone(), config.rag);

        Ok(Self {
            retriever,
            generator,
            pipeline,
            device: device_name,
            model_stage,
            knowledge_base_size,
        })
    }

    /// Assemble an assistant from preloaded subsystems
    ///
    /// Used when the caller already holds a retriever and generator, e.g.
    /// with custom backends.
    pub fn from_parts(
        retriever: Arc<Retriever>,
        generator: Arc<TextGenerator>,
        rag: RagConfig,
        device: &str,
        model_stage: Option<ModelStage>,
        knowledge_base_size: usize,
    ) -> Self {
        let pipeline = SupportPipeline::new(retriever.clone(), generator.clone(), rag);
        Self {
            retriever,
            generator,
            pipeline,
            device: device.to_string(),
            model_stage,
            knowledge_base_size,
        }
    }

    /// Answer a customer question through the RAG pipeline
    pub fn answer(&self, question: &str) -> RagResponse {
        self.pipeline.answer(question)
    }

    /// Plain text generation without retrieval
    ///
    /// Missing parameters fall back to the configured defaults.
    pub fn generate(
        &self,
        prompt: &str,
        max_tokens: Option<usize>,
        temperature: Option<f32>,
    ) -> String {
        let config = self.generator.config();
        let max_tokens = max_tokens.unwrap_or(config.default_max_tokens);
        let temperature = temperature.unwrap_or(config.default_temperature);
        self.generator
            .generate(prompt, max_tokens, temperature)
            .into_text()
    }

    /// Current health snapshot
    pub fn status(&self) -> ServiceStatus {
        let rag_available = self.retriever.is_ready();
        let status = if rag_available && self.generator.is_ready() {
            "healthy"
        } else {
            "degraded"
        };

        ServiceStatus {
            status: status.to_string(),
            llm_model: self.generator.model_id().map(|id| id.to_string()),
            model_stage: self.model_stage,
            device: self.device.clone(),
            rag_available,
            knowledge_base_size: self.knowledge_base_size,
        }
    }

    /// Service identity for the root endpoint
    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            status: "online".to_string(),
            service: SERVICE_NAME.to_string(),
            model: self.generator.model_id().map(|id| id.to_string()),
            device: self.device.clone(),
            endpoints: vec![
                "/chat".to_string(),
                "/generate".to_string(),
                "/health".to_string(),
            ],
            version: SERVICE_VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::backends::MockEmbedder;
    use crate::generation::CompletionModel;
    use std::sync::Mutex;

    struct RecordingModel {
        last_args: Mutex<Option<(usize, f32)>>,
    }

    impl RecordingModel {
        fn new() -> Self {
            Self {
                last_args: Mutex::new(None),
            }
        }
    }

    impl CompletionModel for RecordingModel {
        fn complete(&self, _prompt: &str, max_new_tokens: usize, temperature: f32) -> Result<String> {
            *self.last_args.lock().unwrap() = Some((max_new_tokens, temperature));
            Ok("generated text".to_string())
        }

        fn model_id(&self) -> &str {
            "recording-stub"
        }
    }

    fn mock_retriever() -> Arc<Retriever> {
        let embedder = Arc::new(MockEmbedder::new(EmbeddingConfig::default(), 16));
        Arc::new(
            Retriever::build(
                KnowledgeBase::builtin().into_documents(),
                embedder,
                RetrieverConfig::default(),
            )
            .unwrap(),
        )
    }

    fn healthy_assistant(model: Arc<RecordingModel>) -> Assistant {
        Assistant::from_parts(
            mock_retriever(),
            Arc::new(TextGenerator::new(model, GenerationConfig::default())),
            RagConfig::default(),
            "cpu",
            Some(ModelStage::Primary),
            5,
        )
    }

    #[test]
    fn test_status_healthy() {
        let assistant = healthy_assistant(Arc::new(RecordingModel::new()));
        let status = assistant.status();

        assert_eq!(status.status, "healthy");
        assert_eq!(status.llm_model.as_deref(), Some("recording-stub"));
        assert_eq!(status.model_stage, Some(ModelStage::Primary));
        assert_eq!(status.device, "cpu");
        assert!(status.rag_available);
        assert_eq!(status.knowledge_base_size, 5);
    }

    #[test]
    fn test_status_degraded_without_model() {
        let assistant = Assistant::from_parts(
            mock_retriever(),
            Arc::new(TextGenerator::unavailable(GenerationConfig::default())),
            RagConfig::default(),
            "cpu",
            None,
            5,
        );
        let status = assistant.status();

        assert_eq!(status.status, "degraded");
        assert_eq!(status.llm_model, None);
        assert_eq!(status.model_stage, None);
        assert!(status.rag_available);
    }

    #[test]
    fn test_status_degraded_without_retrieval() {
        let assistant = Assistant::from_parts(
            Arc::new(Retriever::unavailable(
                KnowledgeBase::builtin().into_documents(),
                RetrieverConfig::default(),
            )),
            Arc::new(TextGenerator::new(
                Arc::new(RecordingModel::new()),
                GenerationConfig::default(),
            )),
            RagConfig::default(),
            "cpu",
            Some(ModelStage::Fallback),
            5,
        );
        let status = assistant.status();

        assert_eq!(status.status, "degraded");
        assert!(!status.rag_available);
        assert_eq!(status.model_stage, Some(ModelStage::Fallback));
    }

    #[test]
    fn test_initialize_degrades_when_model_missing() {
        // Path-like model ids fail resolution without touching the network
        let config = AssistantConfig {
            embedding_backend: "mock".to_string(),
            generator: GeneratorConfig::new("/nonexistent/support-model").without_fallback(),
            device: DevicePreference::Cpu,
            ..Default::default()
        };

        let assistant = Assistant::initialize(config).unwrap();
        let status = assistant.status();

        assert_eq!(status.status, "degraded");
        assert_eq!(status.llm_model, None);
        assert_eq!(status.model_stage, None);
        assert_eq!(status.device, "cpu");
        assert!(status.rag_available);
        assert_eq!(status.knowledge_base_size, 5);
    }

    #[test]
    fn test_generate_applies_defaults() {
        let model = Arc::new(RecordingModel::new());
        let assistant = healthy_assistant(model.clone());

        let text = assistant.generate("Tell me a joke", None, None);
        assert_eq!(text, "generated text");

        let (max_tokens, temperature) = model.last_args.lock().unwrap().unwrap();
        assert_eq!(max_tokens, 200);
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_generate_respects_explicit_parameters() {
        let model = Arc::new(RecordingModel::new());
        let assistant = healthy_assistant(model.clone());

        assistant.generate("Tell me a joke", Some(50), Some(0.0));

        let (max_tokens, temperature) = model.last_args.lock().unwrap().unwrap();
        assert_eq!(max_tokens, 50);
        assert_eq!(temperature, 0.0);
    }

    #[test]
    fn test_info_lists_endpoints() {
        let assistant = healthy_assistant(Arc::new(RecordingModel::new()));
        let info = assistant.info();

        assert_eq!(info.status, "online");
        assert_eq!(info.service, "Shoplite AI Assistant");
        assert_eq!(info.version, "2.0");
        assert_eq!(info.endpoints, vec!["/chat", "/generate", "/health"]);
    }
}
