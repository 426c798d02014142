use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tailor_api::{RecommendationEngine, RestApi, ServiceConfig, ServiceContext};
use tailor_core::{Encoder, HashingEncoder, DEFAULT_ENCODER_DIM};
use tailor_generation::HttpBackend;
use tailor_storage::{KnowledgeBuilder, KnowledgeStructurer};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Hybrid retrieval-and-scoring clothing recommender
#[derive(Parser, Debug)]
#[command(name = "tailor")]
#[command(about = "Explainable clothing recommendations", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the recommendation API
    Serve {
        /// Path to the JSON service config
        #[arg(short, long, default_value = "tailor.json")]
        config: PathBuf,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// HTTP API port
        #[arg(long, default_value_t = 8000)]
        http_port: u16,
    },

    /// Build a knowledge snapshot from curated sources or raw conversations
    BuildKnowledge {
        /// JSON array of knowledge sources, or raw conversations with --structure-with
        #[arg(short, long)]
        input: PathBuf,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Encoder dimension; must match the service config
        #[arg(long, default_value_t = DEFAULT_ENCODER_DIM)]
        encoder_dim: usize,

        /// Service config whose backend structures raw conversations first
        #[arg(long)]
        structure_with: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Serve {
            config,
            host,
            http_port,
        } => serve(config, host, http_port).await,
        Command::BuildKnowledge {
            input,
            output,
            encoder_dim,
            structure_with,
        } => build_knowledge(input, output, encoder_dim, structure_with).await,
    }
}

async fn build_knowledge(
    input: PathBuf,
    output: PathBuf,
    encoder_dim: usize,
    structure_with: Option<PathBuf>,
) -> anyhow::Result<()> {
    let encoder: Arc<dyn Encoder> = Arc::new(HashingEncoder::new(encoder_dim)?);
    info!("Building knowledge snapshot with encoder {}", encoder.id());
    let builder = KnowledgeBuilder::new(encoder);

    let header = match structure_with {
        Some(config_path) => {
            let config = ServiceConfig::load(&config_path)?;
            let backend_config = config
                .backend
                .with_context(|| format!("{:?} configures no generation backend", config_path))?;
            let backend = HttpBackend::new(backend_config).context("Failed to create generation backend")?;
            info!("Structuring conversations with {}", backend.url());

            let structurer = KnowledgeStructurer::new(Arc::new(backend), config.generation);
            builder
                .build_conversations_file(&structurer, &input, &output)
                .await?
        }
        None => builder.build_file(&input, &output)?,
    };
    info!(
        "Wrote {} entries ({} dims) to {:?}",
        header.count, header.dim, output
    );
    Ok(())
}

async fn serve(config_path: PathBuf, host: String, http_port: u16) -> anyhow::Result<()> {
    info!("Starting Tailor v{}", env!("CARGO_PKG_VERSION"));
    info!("Config: {:?}", config_path);

    let config = ServiceConfig::load(&config_path)?;
    let context = Arc::new(ServiceContext::new());

    // Serve /healthz and /readyz while the catalog and index load
    let loader_context = context.clone();
    let loader = tokio::task::spawn_blocking(move || {
        match RecommendationEngine::from_config(&config) {
            Ok(engine) => {
                info!(
                    "Loaded {} catalog records, {} knowledge entries",
                    engine.catalog().len(),
                    engine.parser().index().len()
                );
                if let Err(e) = loader_context.install(engine) {
                    loader_context.fail(e.to_string());
                }
            }
            Err(e) => loader_context.fail(format!("{:#}", e)),
        }
    });

    let context_http = context.clone();
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(context_http, &host, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    context.shutdown();
    if loader.is_finished() {
        loader.await.context("Loader task panicked")?;
    }
    Ok(())
}
