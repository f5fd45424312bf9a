//! List the scenes a file declares.

use std::path::PathBuf;

use liveview_common::config::AppConfig;

pub fn run(config: &AppConfig, file: PathBuf, json: bool, strict: bool) -> anyhow::Result<()> {
    let scenes = super::scanner(config, strict).scan_file(&file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&scenes)?);
        return Ok(());
    }

    if scenes.is_empty() {
        println!("No Manim Scene classes found in {}", file.display());
        return Ok(());
    }

    println!("Scenes in {}:", file.display());
    for scene in &scenes {
        println!("  {:<32} line {}", scene.name, scene.line);
    }
    Ok(())
}
