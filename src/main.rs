use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scene_echo::api::{ApiServer, ApiState};
use scene_echo::pipeline::{AlertSink, CycleOutcome, Orchestrator};
use scene_echo::vision::{GeminiVision, SceneDescriber};
use scene_echo::voice::{SpeechPlayback, TextToSpeech, playback};
use scene_echo::{Config, FileCamera, SceneClient};

/// Scene Echo - describe a captured scene and speak it aloud
#[derive(Parser)]
#[command(name = "scene-echo", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the describe HTTP endpoint
    Serve {
        /// Port to listen on
        #[arg(long, env = "SCENE_ECHO_PORT", default_value = "8080")]
        port: u16,
    },
    /// Upload a local image and print the scene description
    Describe {
        /// Path to the image file
        image: PathBuf,
    },
    /// Synthesize text and play it through the speakers
    Speak {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Run one full capture, describe, and speak cycle
    Cycle {
        /// Path to the image file standing in for the camera
        image: PathBuf,
    },
}

/// Alerts rendered on standard error, the CLI stand-in for a dialog
struct ConsoleAlerts;

impl AlertSink for ConsoleAlerts {
    fn alert(&self, message: &str) {
        eprintln!("Error: {message}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,scene_echo=info",
        1 => "info,scene_echo=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env();

    match cli.command {
        Command::Serve { port } => serve(&config, port).await,
        Command::Describe { image } => {
            let client = SceneClient::new(config.endpoint.clone());
            let text = client.upload_path(&image).await?;
            println!("{text}");
            Ok(())
        }
        Command::Speak { text } => speak(&config, &text).await,
        Command::Cycle { image } => cycle(&config, image).await,
    }
}

async fn serve(config: &Config, port: u16) -> anyhow::Result<()> {
    let describer = match config.vision_api_key.clone() {
        Some(key) => {
            let mut vision = GeminiVision::new(key)?;
            if let Some(model) = config.vision_model.clone() {
                vision = vision.with_model(model);
            }
            Some(Arc::new(vision) as Arc<dyn SceneDescriber>)
        }
        None => {
            tracing::warn!(
                "GEMINI_API_KEY not set, describe requests will be rejected with 500"
            );
            None
        }
    };

    let state = Arc::new(ApiState {
        describer,
        max_image_bytes: config.max_image_bytes,
    });

    ApiServer::new(state, port).run().await?;
    Ok(())
}

async fn speak(config: &Config, text: &str) -> anyhow::Result<()> {
    let key = config
        .speech_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("ELEVENLABS_API_KEY not set"))?;

    let tts = TextToSpeech::new(key, config.voice_id.clone())?;
    let audio = tts.synthesize(text).await?;
    tracing::info!(bytes = audio.len(), "audio synthesized");

    tokio::task::spawn_blocking(move || playback::play_mp3(&audio)).await??;
    Ok(())
}

async fn cycle(config: &Config, image: PathBuf) -> anyhow::Result<()> {
    let tts = match config.speech_api_key.clone() {
        Some(key) => Some(TextToSpeech::new(key, config.voice_id.clone())?),
        None => {
            tracing::warn!("ELEVENLABS_API_KEY not set, spoken feedback disabled");
            None
        }
    };

    let orchestrator = Orchestrator::new(
        Arc::new(FileCamera::new(image)),
        Arc::new(SceneClient::new(config.endpoint.clone())),
        Arc::new(SpeechPlayback::new(tts)),
        Arc::new(ConsoleAlerts),
    );

    match orchestrator.trigger().await {
        CycleOutcome::Described(text) => {
            println!("{text}");
            Ok(())
        }
        CycleOutcome::Failed => Err(anyhow::anyhow!("pipeline cycle failed")),
        CycleOutcome::Dropped => unreachable!("fresh orchestrator is idle"),
    }
}
