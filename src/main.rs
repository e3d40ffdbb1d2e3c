//! # Gravewalk Main Entry Point
//!
//! Parses the command line, sets up logging, audio and the description
//! runtime, then hands control to the macroquad frame loop.

use clap::{Parser, ValueEnum};
use gravewalk::scenes::{self, SceneManager};
use gravewalk::services::{DescriptionTracker, LocalLore, MacroquadAudio, SettingsStore};
use gravewalk::{
    EngineConfig, GameSession, GenerationConfig, GravewalkResult, InputHandler, PlayerClass,
    TurnEngine,
};
use macroquad::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "dev-tools")]
use tracing::{error, info};

#[cfg(not(feature = "dev-tools"))]
use log::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ClassArg {
    Warrior,
    Ranger,
    Sapper,
}

impl From<ClassArg> for PlayerClass {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::Warrior => PlayerClass::Warrior,
            ClassArg::Ranger => PlayerClass::Ranger,
            ClassArg::Sapper => PlayerClass::Sapper,
        }
    }
}

/// Command line arguments for Gravewalk.
#[derive(Parser, Debug)]
#[command(name = "gravewalk")]
#[command(about = "A turn-based crypt crawl, one screen at a time")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Start as this class instead of choosing on screen
    #[arg(short, long, value_enum)]
    class: Option<ClassArg>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Where volume settings are stored
    #[arg(long, default_value = "gravewalk-settings.json")]
    settings: PathBuf,

    /// JSON file overriding the engine tuning
    #[arg(long)]
    engine_config: Option<PathBuf>,

    /// World width in screens
    #[arg(long)]
    screens_x: Option<u32>,

    /// World height in screens
    #[arg(long)]
    screens_y: Option<u32>,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Gravewalk".to_owned(),
        window_width: 1100,
        window_height: 720,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() -> GravewalkResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);

    info!("Starting Gravewalk v{}", gravewalk::VERSION);

    if let Err(err) = run_game(&args).await {
        error!("Gravewalk stopped: {}", err);
        return Err(err);
    }
    Ok(())
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let filter = tracing_subscriber::EnvFilter::try_new(log_level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .format_timestamp_millis()
            .init();
    }
}

async fn run_game(args: &Args) -> GravewalkResult<()> {
    let engine_config = match &args.engine_config {
        Some(path) => {
            info!("Loading engine tuning from {}", path.display());
            EngineConfig::load(path)?
        }
        None => EngineConfig::default(),
    };

    let seed = args.seed.unwrap_or_else(::rand::random);
    info!("Dungeon seed: {}", seed);
    let mut generation = GenerationConfig::new(seed);
    if let Some(screens_x) = args.screens_x {
        generation.screens_x = screens_x.max(1);
    }
    if let Some(screens_y) = args.screens_y {
        generation.screens_y = screens_y.max(1);
    }

    // Description lookups run here while macroquad owns the main thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let descriptions = DescriptionTracker::new(Arc::new(LocalLore::new()), runtime.handle().clone());

    let store = SettingsStore::new(&args.settings);
    let settings = store.load();
    let audio = MacroquadAudio::load(&settings).await;

    let class = match args.class {
        Some(class) => class.into(),
        None => scenes::choose_class().await,
    };

    let engine = TurnEngine::new(engine_config, generation);
    let session = GameSession::new(engine, class, Box::new(audio), descriptions)?
        .with_settings(store, settings);

    let mut scenes = SceneManager::new(session, InputHandler::new());
    scenes.run().await?;

    runtime.shutdown_background();
    info!("Goodbye");
    Ok(())
}
