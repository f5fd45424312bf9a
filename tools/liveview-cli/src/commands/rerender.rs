//! Render the last scene again.

use std::path::PathBuf;
use std::sync::Arc;

use liveview_common::config::AppConfig;
use liveview_render_engine::ConsoleSink;
use liveview_scene_model::QualityTier;

pub async fn run(
    config: &AppConfig,
    quality: Option<String>,
    workspace: Option<PathBuf>,
) -> anyhow::Result<()> {
    let workspace = super::workspace_dir(workspace)?;
    let mut session = super::session(config, &workspace);

    let quality = match (quality.as_deref(), session.last_run()) {
        (Some(code), _) => QualityTier::from_code(code),
        (None, Some(run)) => run.quality,
        (None, None) => super::quality_or_default(config, None),
    };

    let outcome = session.rerender(quality, Arc::new(ConsoleSink::stderr())).await?;
    super::render::report(outcome)
}
