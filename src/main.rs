use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shoplite_assistant::assistant::{Assistant, AssistantConfig};
use shoplite_assistant::generation::candle::GeneratorConfig;
use shoplite_assistant::model::DevicePreference;
use shoplite_assistant::server;

#[derive(Parser)]
#[command(name = "shoplite-assistant")]
#[command(about = "Shoplite customer-support assistant with retrieval-augmented generation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the assistant API server
    Serve {
        /// Port to listen on; falls back to $PORT, then 8000
        #[arg(short, long)]
        port: Option<u16>,

        /// Embedding backend: minilm, token, or mock
        #[arg(long, default_value = "minilm")]
        embedding_backend: String,

        /// Completion model ID or local path
        #[arg(short, long, default_value = "Qwen/Qwen2.5-1.5B-Instruct")]
        model: String,

        /// Device: auto, cpu, cuda, or metal
        #[arg(long, default_value = "auto")]
        device: String,
    },

    /// Ask a single question through the RAG pipeline
    Ask {
        /// Question text
        question: String,

        /// Embedding backend: minilm, token, or mock
        #[arg(long, default_value = "minilm")]
        embedding_backend: String,

        /// Completion model ID or local path
        #[arg(short, long, default_value = "Qwen/Qwen2.5-1.5B-Instruct")]
        model: String,

        /// Device: auto, cpu, cuda, or metal
        #[arg(long, default_value = "auto")]
        device: String,
    },

    /// Generate text without retrieval
    Generate {
        /// Prompt text
        prompt: String,

        /// Token budget for the completion
        #[arg(long, default_value = "200")]
        max_tokens: usize,

        /// Sampling temperature (0 decodes greedily)
        #[arg(long, default_value = "0.7")]
        temperature: f32,

        /// Completion model ID or local path
        #[arg(short, long, default_value = "Qwen/Qwen2.5-1.5B-Instruct")]
        model: String,

        /// Device: auto, cpu, cuda, or metal
        #[arg(long, default_value = "auto")]
        device: String,
    },
}

fn build_config(
    embedding_backend: &str,
    model: &str,
    device: &str,
) -> anyhow::Result<AssistantConfig> {
    let device: DevicePreference = device.parse()?;
    Ok(AssistantConfig {
        embedding_backend: embedding_backend.to_string(),
        generator: GeneratorConfig::new(model).with_device(device),
        device,
        ..Default::default()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoplite_assistant=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            embedding_backend,
            model,
            device,
        } => {
            let port = port
                .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
                .unwrap_or(8000);

            let config = build_config(&embedding_backend, &model, &device)?;
            let assistant = Assistant::initialize(config)?;

            let status = assistant.status();
            tracing::info!("Service status: {}", status.status);
            tracing::info!(
                "Model: {}",
                status.llm_model.as_deref().unwrap_or("unavailable")
            );
            tracing::info!("Device: {}", status.device);

            server::serve(Arc::new(assistant), port).await?;
        }

        Commands::Ask {
            question,
            embedding_backend,
            model,
            device,
        } => {
            let config = build_config(&embedding_backend, &model, &device)?;
            let assistant = Assistant::initialize(config)?;

            let response = assistant.answer(&question);
            println!("{}", response.answer);
            if !response.sources.is_empty() {
                println!();
                println!("Sources: {}", response.sources.join(", "));
            }
            println!("Confidence: {}", response.confidence);
        }

        Commands::Generate {
            prompt,
            max_tokens,
            temperature,
            model,
            device,
        } => {
            // Retrieval is unused here; skip loading the embedding backend
            let config = build_config("mock", &model, &device)?;
            let assistant = Assistant::initialize(config)?;

            let text = assistant.generate(&prompt, Some(max_tokens), Some(temperature));
            println!("{}", text);
        }
    }

    Ok(())
}
