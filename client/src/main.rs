//! Terminal build of the NetHelp board.
//!
//! Loads the layered configuration, sets up logging and wires the in-memory
//! collaborators into an [`App`]. The terminal loop then plays the part of
//! the browser: it feeds UI events, position fixes and other participants.

mod terminal;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adapters::{
    ChannelPositionSource, FileStorage, LocalStorage, MemoryRealtimeHub, MemoryStorage,
    RecordingCanvas, ScriptedConfirm,
};
use anyhow::{Context, Result};
use clap::Parser;
use nethelp::config::LoggingConfig;
use nethelp::{Adapters, App, AppConfig};
use tracing_subscriber::EnvFilter;

use crate::terminal::Simulation;

/// NetHelp - share your live location with everyone on the board
#[derive(Parser)]
#[command(name = "nethelp")]
#[command(about = "NetHelp - share your live location with everyone on the board")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local storage file (overrides config)
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(config: &LoggingConfig, verbose: u8) {
    let level = match verbose {
        0 => config.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout belongs to the board view.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.config {
        if !Path::new(path).is_file() {
            anyhow::bail!("config file does not exist: {}", path.display());
        }
    }

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = cli.storage {
        config.storage.path = Some(path);
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    init_logging(&config.logging, cli.verbose);
    tracing::info!("NetHelp starting");

    let storage: Arc<dyn LocalStorage> = match &config.storage.path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using file storage");
            Arc::new(FileStorage::new(path))
        }
        None => Arc::new(MemoryStorage::new()),
    };

    let hub = MemoryRealtimeHub::new();
    let position_source = ChannelPositionSource::new();
    let confirm = ScriptedConfirm::always(false);
    let sim = Simulation {
        feed: position_source.feed(),
        peers: hub.connect(),
        confirm: confirm.clone(),
    };

    let app = App::new(
        config,
        Adapters {
            store: Arc::new(hub.connect()),
            storage,
            position_source: Box::new(position_source),
            canvas: Box::new(RecordingCanvas::new()),
            confirm: Box::new(confirm),
        },
    );

    terminal::run(app, sim).await
}
