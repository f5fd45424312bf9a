pub mod check;
pub mod locate;
pub mod render;
pub mod rerender;
pub mod scan;

use std::path::{Path, PathBuf};

use liveview_common::config::AppConfig;
use liveview_render_engine::{RenderInvoker, RenderSession};
use liveview_scene_model::{BaseMatch, QualityTier, SceneScanner};

/// Where the last run is remembered, relative to the workspace.
const STATE_FILE: &str = ".manim-liveview/last_run.json";

/// The given workspace, or the current directory.
pub fn workspace_dir(workspace: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match workspace {
        Some(dir) if dir.is_dir() => Ok(dir),
        Some(dir) => anyhow::bail!("Workspace is not a directory: {}", dir.display()),
        None => Ok(std::env::current_dir()?),
    }
}

/// Quality from the command line, or the configured default.
pub fn quality_or_default(config: &AppConfig, quality: Option<&str>) -> QualityTier {
    QualityTier::from_code(quality.unwrap_or(&config.default_quality))
}

pub fn scanner(config: &AppConfig, strict: bool) -> SceneScanner {
    if strict || config.strict_base_match {
        SceneScanner::new(BaseMatch::TokenBoundary)
    } else {
        SceneScanner::default()
    }
}

pub fn session(config: &AppConfig, workspace: &Path) -> RenderSession {
    let invoker = RenderInvoker::new(config.output_root(workspace))
        .with_executable(config.executable.clone());
    RenderSession::new(invoker, workspace)
        .with_scanner(scanner(config, false))
        .with_cache_disabled(config.disable_cache)
        .with_state_file(workspace.join(STATE_FILE))
}
