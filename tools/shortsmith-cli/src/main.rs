//! Shortsmith CLI: render vertical shorts from timeline files.
//!
//! Usage:
//!   shortsmith render <TIMELINE>   Run one render job against the local store
//!   shortsmith status <KEY>        Show the markers of a job
//!   shortsmith check               Check ffmpeg and font availability

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shortsmith_common::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "shortsmith",
    about = "Compose vertical short videos from declarative timelines",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/shortsmith/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a timeline JSON file
    Render {
        /// Path to the timeline (render request) JSON
        timeline: PathBuf,

        /// Object store root directory
        #[arg(long)]
        store: Option<PathBuf>,

        /// Override the output key from the timeline file
        #[arg(long)]
        key: Option<String>,
    },

    /// Show the status, manifest, or error marker of a job
    Status {
        /// Output key of the job
        key: String,

        /// Object store root directory
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Check ffmpeg, ffprobe, and font resolution
    Check,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {e}")),
        None => Ok(AppConfig::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    shortsmith_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Render {
            timeline,
            store,
            key,
        } => {
            if let Some(store) = store {
                config.storage_root = store;
            }
            commands::render::run(config, timeline, key).await
        }
        Commands::Status { key, store } => {
            if let Some(store) = store {
                config.storage_root = store;
            }
            commands::status::run(config, key).await
        }
        Commands::Check => commands::check::run(&config),
    }
}
