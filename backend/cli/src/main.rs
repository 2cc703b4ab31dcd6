use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use finsight_config::{AppConfig, ConfigError, Credentials, SpeechBackend};
use finsight_gateway::{start_server, AnalysisPipeline, GatewayState, SessionRegistry};
use finsight_logging::init_logger;
use finsight_tts::{create_tts, InlineAudioPlayer, SpeechRenderer, TtsProvider, TtsProviderKind};
use finsight_vision::{InferenceClient, OpenAiVisionProvider};

#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "finsight: identify fish species from a photo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Query a running server's health endpoint
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let _log_guard = init_logger(&config.log_dir, &config.log_level);

    match cli.command {
        Commands::Serve { port } => {
            let config = AppConfig {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config, Credentials::resolve).await?;
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("finsight is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

/// Resolve credentials, wire the providers and serve. A missing credential
/// stops here, before anything is bound.
async fn run_server<R>(config: AppConfig, resolve: R) -> Result<()>
where
    R: FnOnce(&Path) -> Result<Credentials, ConfigError>,
{
    let credentials = resolve(&config.secrets_path).map_err(|e| {
        error!(error = %e, "Cannot start without credentials");
        e
    })?;

    info!(
        port = config.port,
        bind = %config.bind_address,
        model = %config.model,
        profile = %config.profile,
        trigger = %config.trigger,
        "Starting finsight"
    );

    std::fs::create_dir_all(&config.audio_dir)?;
    let state = build_state(&config, &credentials);
    let addr = format!("{}:{}", config.bind_address, config.port);
    start_server(&addr, state).await
}

fn build_state(config: &AppConfig, credentials: &Credentials) -> GatewayState {
    let vision = OpenAiVisionProvider::new(credentials.api_key.expose()).with_base_url(&config.api_base);
    let inference = InferenceClient::new(Arc::new(vision), config.model.clone());

    let kind = match config.speech_backend {
        SpeechBackend::OpenAi => TtsProviderKind::OpenAi {
            api_key: credentials.api_key.expose().to_string(),
            base_url: config.api_base.clone(),
        },
        SpeechBackend::Google => TtsProviderKind::Google,
    };
    let tts: Arc<dyn TtsProvider> = Arc::from(create_tts(kind));
    let renderer = SpeechRenderer::new(
        tts,
        Arc::new(InlineAudioPlayer),
        config.audio_dir.clone(),
        config.speech_language.clone(),
    );

    let pipeline = AnalysisPipeline::new(inference, config.profile)
        .with_speech(Arc::new(renderer))
        .with_jpeg_quality(config.jpeg_quality);

    GatewayState::new(pipeline, SessionRegistry::new(config.trigger), config.max_upload_bytes)
}
