//! Render requests and the remembered last run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quality::QualityTier;

/// Everything needed to launch one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Python file declaring the scene.
    pub source_file: PathBuf,

    /// Scene class to render.
    pub scene_name: String,

    /// Quality preset.
    pub quality: QualityTier,

    /// Ask the renderer to skip its partial-movie cache.
    pub disable_cache: bool,
}

impl RenderRequest {
    pub fn new(
        source_file: impl Into<PathBuf>,
        scene_name: impl Into<String>,
        quality: QualityTier,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            scene_name: scene_name.into(),
            quality,
            disable_cache: false,
        }
    }

    pub fn with_cache_disabled(mut self, disable_cache: bool) -> Self {
        self.disable_cache = disable_cache;
        self
    }
}

/// The last scene a session rendered, kept so it can be rerendered at a
/// different quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Python file the scene came from.
    pub source_file: PathBuf,

    /// Scene class name.
    pub scene_name: String,

    /// Quality of the most recent render.
    pub quality: QualityTier,

    /// When the most recent render finished.
    #[serde(default)]
    pub rendered_at: Option<DateTime<Utc>>,

    /// Artifact the most recent render produced, if one was found.
    #[serde(default)]
    pub artifact: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(
        source_file: impl Into<PathBuf>,
        scene_name: impl Into<String>,
        quality: QualityTier,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            scene_name: scene_name.into(),
            quality,
            rendered_at: None,
            artifact: None,
        }
    }

    /// Build a request for this run at its current quality.
    pub fn to_request(&self, disable_cache: bool) -> RenderRequest {
        RenderRequest::new(&self.source_file, &self.scene_name, self.quality)
            .with_cache_disabled(disable_cache)
    }

    /// Record a finished render.
    pub fn record_result(&mut self, artifact: Option<PathBuf>) {
        self.rendered_at = Some(Utc::now());
        self.artifact = artifact;
    }
}
