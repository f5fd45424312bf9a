//! Manim LiveView CLI: render Manim scenes and find the resulting video.
//!
//! Usage:
//!   manim-liveview scan <FILE>              List the scenes a file declares
//!   manim-liveview render <FILE>            Render a scene
//!   manim-liveview rerender                 Render the last scene again
//!   manim-liveview locate <SCENE>           Find an already rendered video
//!   manim-liveview check                    Check the renderer is installed

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use liveview_common::config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "manim-liveview",
    about = "Render Manim scenes and preview the resulting video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scene classes declared in a Python file
    Scan {
        /// Python source file
        file: PathBuf,

        /// Print scenes as JSON
        #[arg(long)]
        json: bool,

        /// Only accept exact base-class names (no substring matches)
        #[arg(long)]
        strict: bool,
    },

    /// Render a scene and print the path of the produced video
    Render {
        /// Python source file
        file: PathBuf,

        /// Scene class to render (required when the file declares several)
        #[arg(short, long)]
        scene: Option<String>,

        /// Quality: l|m|h|p|k (480p, 720p, 1080p, 2K, 4K)
        #[arg(short, long)]
        quality: Option<String>,

        /// Workspace directory the renderer runs in
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Let the renderer reuse its partial-movie cache
        #[arg(long)]
        keep_cache: bool,
    },

    /// Render the last scene again, without cache
    Rerender {
        /// Quality: l|m|h|p|k (defaults to the last run's quality)
        #[arg(short, long)]
        quality: Option<String>,

        /// Workspace directory the renderer runs in
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },

    /// Find a rendered video without running the renderer
    Locate {
        /// Scene class name
        scene: String,

        /// Quality: l|m|h|p|k
        #[arg(short, long)]
        quality: Option<String>,

        /// Workspace directory holding the media output
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },

    /// Check that the renderer is installed
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    liveview_common::logging::init_logging(&LoggingConfig {
        level,
        json: cli.json_logs || config.logging.json,
    });
    tracing::debug!(?config, "Loaded configuration");

    match cli.command {
        Commands::Scan { file, json, strict } => commands::scan::run(&config, file, json, strict),
        Commands::Render {
            file,
            scene,
            quality,
            workspace,
            keep_cache,
        } => commands::render::run(&config, file, scene, quality, workspace, keep_cache).await,
        Commands::Rerender { quality, workspace } => {
            commands::rerender::run(&config, quality, workspace).await
        }
        Commands::Locate {
            scene,
            quality,
            workspace,
        } => commands::locate::run(&config, scene, quality, workspace),
        Commands::Check => commands::check::run(&config),
    }
}
