//! Check system capabilities.

use liveview_common::config::{config_file_path, AppConfig};
use liveview_render_engine::RenderInvoker;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Manim LiveView System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }

    let invoker = RenderInvoker::new(&config.media_dir).with_executable(config.executable.clone());
    let available = invoker.is_available();
    if available {
        println!("[OK] Renderer: {}", invoker.executable());
    } else {
        println!("[FAIL] Renderer: {} not found on PATH", invoker.executable());
    }

    let workspace = std::env::current_dir()?;
    let output_root = config.output_root(&workspace);
    if output_root.is_dir() {
        println!("[OK] Output root: {}", output_root.display());
    } else {
        println!(
            "[WARN] Output root: {} does not exist yet",
            output_root.display()
        );
    }

    println!();
    if available {
        println!("All required capabilities are available. Manim LiveView is ready.");
    } else {
        println!(
            "Install Manim (https://docs.manim.community) or set \"executable\" in {}.",
            config_path.display()
        );
    }

    Ok(())
}
