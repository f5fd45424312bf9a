//! Find a rendered video without rendering.

use std::path::PathBuf;

use liveview_common::config::AppConfig;
use liveview_render_engine::locate;

pub fn run(
    config: &AppConfig,
    scene: String,
    quality: Option<String>,
    workspace: Option<PathBuf>,
) -> anyhow::Result<()> {
    let workspace = super::workspace_dir(workspace)?;
    let quality = super::quality_or_default(config, quality.as_deref());
    let output_root = config.output_root(&workspace);

    match locate(&output_root, &scene, quality) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => anyhow::bail!(
            "No {} video for {scene} under {}",
            quality.directory(),
            output_root.display()
        ),
    }
}
