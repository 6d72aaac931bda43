//! HTTP service surface
//!
//! Exposes the assistant over four routes: service identity at `/`,
//! `/health`, RAG chat at `/chat` and plain generation at `/generate`.
//! Inference runs on the blocking pool so request handling stays responsive
//! while the model works.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::assistant::{Assistant, ServiceInfo, ServiceStatus};
use crate::rag::RagResponse;

/// Body of a `/chat` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Body of a `/generate` request; omitted fields use the configured defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// Body of a `/generate` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
}

/// Build the service router
pub fn router(assistant: Arc<Assistant>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/generate", post(generate))
        .layer(cors)
        .with_state(assistant)
}

/// Serve the assistant on the given port until interrupted
pub async fn serve(assistant: Arc<Assistant>, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(assistant);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Assistant API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Assistant API stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        // No signal handler; park so the server runs until killed
        Err(_) => std::future::pending::<()>().await,
    }
}

async fn root(State(assistant): State<Arc<Assistant>>) -> Json<ServiceInfo> {
    Json(assistant.info())
}

async fn health(State(assistant): State<Arc<Assistant>>) -> Json<ServiceStatus> {
    Json(assistant.status())
}

async fn chat(
    State(assistant): State<Arc<Assistant>>,
    Json(request): Json<ChatRequest>,
) -> Json<RagResponse> {
    let result =
        tokio::task::spawn_blocking(move || assistant.answer(&request.question)).await;

    match result {
        Ok(response) => Json(response),
        Err(e) => {
            tracing::error!("Chat worker failed: {}", e);
            Json(RagResponse::processing_failure())
        }
    }
}

async fn generate(
    State(assistant): State<Arc<Assistant>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, StatusCode> {
    let result = tokio::task::spawn_blocking(move || {
        assistant.generate(&request.prompt, request.max_tokens, request.temperature)
    })
    .await;

    match result {
        Ok(text) => Ok(Json(GenerateResponse { text })),
        Err(e) => {
            tracing::error!("Generate worker failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::backends::MockEmbedder;
    use crate::embedding::EmbeddingConfig;
    use crate::generation::{CompletionModel, GenerationConfig, TextGenerator};
    use crate::kb::KnowledgeBase;
    use crate::rag::{Confidence, RagConfig, NO_MATCH_ANSWER};
    use crate::retrieval::{Retriever, RetrieverConfig};
    use anyhow::Result;

    struct StubModel;

    impl CompletionModel for StubModel {
        fn complete(&self, _prompt: &str, _max: usize, _temp: f32) -> Result<String> {
            Ok("stub answer".to_string())
        }

        fn model_id(&self) -> &str {
            "stub-model"
        }
    }

    fn stub_assistant() -> Arc<Assistant> {
        let embedder = Arc::new(MockEmbedder::new(EmbeddingConfig::default(), 16));
        let retriever = Arc::new(
            Retriever::build(
                KnowledgeBase::builtin().into_documents(),
                embedder,
                RetrieverConfig::default(),
            )
            .unwrap(),
        );
        let generator = Arc::new(TextGenerator::new(
            Arc::new(StubModel),
            GenerationConfig::default(),
        ));
        Arc::new(Assistant::from_parts(
            retriever,
            generator,
            RagConfig::default(),
            "cpu",
            None,
            5,
        ))
    }

    #[tokio::test]
    async fn test_root_reports_service_identity() {
        let Json(info) = root(State(stub_assistant())).await;

        assert_eq!(info.status, "online");
        assert_eq!(info.service, "Shoplite AI Assistant");
        assert_eq!(info.endpoints, vec!["/chat", "/generate", "/health"]);
    }

    #[tokio::test]
    async fn test_health_reports_subsystems() {
        let Json(status) = health(State(stub_assistant())).await;

        assert!(status.rag_available);
        assert_eq!(status.knowledge_base_size, 5);
        assert_eq!(status.llm_model.as_deref(), Some("stub-model"));
    }

    #[tokio::test]
    async fn test_chat_returns_well_formed_response() {
        let request = ChatRequest {
            question: "anything at all".to_string(),
        };
        let Json(response) = chat(State(stub_assistant()), Json(request)).await;

        // Hash-based embeddings place queries far from every document, so
        // the no-match branch answers; the shape is what matters here
        assert!(!response.answer.is_empty());
        assert!(
            response.answer == NO_MATCH_ANSWER || response.answer == "stub answer",
            "unexpected answer: {}",
            response.answer
        );
        assert!(matches!(
            response.confidence,
            Confidence::High | Confidence::Medium | Confidence::Low
        ));
    }

    #[tokio::test]
    async fn test_generate_returns_text() {
        let request = GenerateRequest {
            prompt: "Tell me about shipping".to_string(),
            max_tokens: Some(50),
            temperature: Some(0.2),
        };
        let result = generate(State(stub_assistant()), Json(request)).await;

        let Json(response) = result.unwrap();
        assert_eq!(response.text, "stub answer");
    }

    #[tokio::test]
    async fn test_generate_defaults_are_optional() {
        let request = GenerateRequest {
            prompt: "Hello".to_string(),
            max_tokens: None,
            temperature: None,
        };
        let result = generate(State(stub_assistant()), Json(request)).await;

        assert_eq!(result.unwrap().text, "stub answer");
    }

    #[test]
    fn test_generate_request_deserializes_with_defaults_omitted() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"prompt": "hi"}"#).unwrap();

        assert_eq!(request.prompt, "hi");
        assert_eq!(request.max_tokens, None);
        assert_eq!(request.temperature, None);
    }
}
