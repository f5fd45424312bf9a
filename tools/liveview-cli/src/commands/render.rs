//! Render a scene.

use std::path::PathBuf;
use std::sync::Arc;

use liveview_common::config::AppConfig;
use liveview_render_engine::{ConsoleSink, RenderOutcome, SessionError};

pub async fn run(
    config: &AppConfig,
    file: PathBuf,
    scene: Option<String>,
    quality: Option<String>,
    workspace: Option<PathBuf>,
    keep_cache: bool,
) -> anyhow::Result<()> {
    let workspace = super::workspace_dir(workspace)?;
    let mut session = super::session(config, &workspace);
    if keep_cache {
        session = session.with_cache_disabled(false);
    }

    let scene = match session.select_scene(&file, scene.as_deref()) {
        Ok(scene) => scene,
        Err(SessionError::AmbiguousScene { candidates }) => {
            eprintln!("Select a Manim scene to render with --scene:");
            for name in &candidates {
                eprintln!("  {name}");
            }
            anyhow::bail!("{} scenes found, none selected", candidates.len());
        }
        Err(e) => return Err(e.into()),
    };

    let quality = super::quality_or_default(config, quality.as_deref());
    let outcome = session
        .run_scene(&file, &scene, quality, Arc::new(ConsoleSink::stderr()))
        .await?;

    report(outcome)
}

/// Print the video path on stdout; a render with no video is a failure for the shell.
pub fn report(outcome: RenderOutcome) -> anyhow::Result<()> {
    match outcome {
        RenderOutcome::Ready(path) => {
            println!("{}", path.display());
            Ok(())
        }
        RenderOutcome::NotFound => anyhow::bail!("Renderer finished but no video was found"),
        RenderOutcome::Cancelled => anyhow::bail!("Render cancelled"),
    }
}
