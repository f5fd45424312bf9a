//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LiveviewError, LiveviewResult};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Renderer executable, looked up on the search path.
    pub executable: String,

    /// Quality code used when none is given (`l`, `m`, `h`, `p`, `k`).
    pub default_quality: String,

    /// Output root, relative to the workspace directory.
    pub media_dir: PathBuf,

    /// Pass the cache-disable flag on regular runs. Rerenders always disable it.
    pub disable_cache: bool,

    /// Require whole parent-class tokens when detecting scenes.
    pub strict_base_match: bool,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "liveview_render_engine=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            executable: "manim".to_string(),
            default_quality: "l".to_string(),
            media_dir: PathBuf::from("media"),
            disable_cache: true,
            strict_base_match: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from `path`, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> LiveviewResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config to `path` as pretty JSON.
    pub fn save_to(&self, path: &Path) -> LiveviewResult<()> {
        if self.executable.trim().is_empty() {
            return Err(LiveviewError::config("executable must not be empty"));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Output root for a given workspace.
    pub fn output_root(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.media_dir)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("manim-liveview").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_renderer_conventions() {
        let config = AppConfig::default();
        assert_eq!(config.executable, "manim");
        assert_eq!(config.default_quality, "l");
        assert!(config.disable_cache);
        assert!(!config.strict_base_match);
        assert_eq!(
            config.output_root(Path::new("/work")),
            PathBuf::from("/work/media")
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = AppConfig {
            default_quality: "h".to_string(),
            strict_base_match: true,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path), config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "executable": "/opt/manim/bin/manim" }"#).unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.executable, "/opt/manim/bin/manim");
        assert_eq!(config.media_dir, PathBuf::from("media"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unparseable_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }

    #[test]
    fn test_empty_executable_is_rejected_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            executable: "  ".to_string(),
            ..Default::default()
        };
        let err = config.save_to(&dir.path().join("config.json")).unwrap_err();
        assert!(matches!(err, LiveviewError::Config { .. }));
    }
}
