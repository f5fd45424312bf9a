//! Scene discovery.
//!
//! A line such as `class Intro(MovingCameraScene):` declares a scene when
//! its parenthesized parent list names one of the Manim scene base types.
//! Matching is per line; multi-line class headers are not recognized.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use liveview_common::error::{LiveviewError, LiveviewResult};

/// Base types that make a class renderable.
pub const SCENE_BASE_TYPES: [&str; 4] =
    ["Scene", "MovingCameraScene", "ZoomedScene", "ThreeDScene"];

/// Optional indentation, `class`, the class name, then the parent list.
static CLASS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*class\s+(\w+)\s*\((.*)\)").expect("class pattern is valid"));

/// A scene class found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    /// Class name.
    pub name: String,

    /// 1-based line of the class header.
    pub line: usize,
}

/// How the parent list is checked against [`SCENE_BASE_TYPES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseMatch {
    /// The raw parent text contains a base name anywhere, so
    /// `class A(MyScenePlus)` qualifies.
    #[default]
    Substring,

    /// A comma-separated parent equals a base name, optionally behind a
    /// module prefix (`manim.Scene`).
    TokenBoundary,
}

/// Line scanner for scene classes.
#[derive(Debug, Clone)]
pub struct SceneScanner {
    base_types: Vec<String>,
    mode: BaseMatch,
}

impl Default for SceneScanner {
    fn default() -> Self {
        Self {
            base_types: SCENE_BASE_TYPES.iter().map(|s| s.to_string()).collect(),
            mode: BaseMatch::default(),
        }
    }
}

impl SceneScanner {
    pub fn new(mode: BaseMatch) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> BaseMatch {
        self.mode
    }

    /// Scan source text, returning scenes in file order.
    pub fn scan(&self, contents: &str) -> Vec<SceneDescriptor> {
        contents
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let caps = CLASS_LINE.captures(line)?;
                let name = caps.get(1)?.as_str();
                let parents = caps.get(2).map_or("", |m| m.as_str());
                self.qualifies(parents).then(|| SceneDescriptor {
                    name: name.to_string(),
                    line: index + 1,
                })
            })
            .collect()
    }

    /// Scan a file on disk. A missing file has no scenes.
    pub fn scan_file(&self, path: &Path) -> LiveviewResult<Vec<SceneDescriptor>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let scenes = self.scan(&contents);
                tracing::debug!(path = %path.display(), scenes = scenes.len(), "Scanned file");
                Ok(scenes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(LiveviewError::scan(path, e)),
        }
    }

    fn qualifies(&self, parents: &str) -> bool {
        match self.mode {
            BaseMatch::Substring => self
                .base_types
                .iter()
                .any(|base| parents.contains(base.as_str())),
            BaseMatch::TokenBoundary => parents
                .split(',')
                .map(str::trim)
                .filter(|token| !token.contains('='))
                .map(|token| token.rsplit('.').next().unwrap_or(token).trim())
                .any(|token| self.base_types.iter().any(|base| base == token)),
        }
    }
}

/// Scan source text with the default scanner.
pub fn scan(contents: &str) -> Vec<SceneDescriptor> {
    SceneScanner::default().scan(contents)
}

/// Scan a file with the default scanner. A missing file has no scenes.
pub fn scan_file(path: &Path) -> LiveviewResult<Vec<SceneDescriptor>> {
    SceneScanner::default().scan_file(path)
}

/// Whether the text declares at least one scene.
pub fn has_scenes(contents: &str) -> bool {
    !scan(contents).is_empty()
}

/// Whether the file declares at least one scene.
pub fn has_scenes_in_file(path: &Path) -> LiveviewResult<bool> {
    Ok(!scan_file(path)?.is_empty())
}

/// First scene with the given name. Duplicate names resolve to the earliest line.
pub fn find_scene<'a>(scenes: &'a [SceneDescriptor], name: &str) -> Option<&'a SceneDescriptor> {
    scenes.iter().find(|scene| scene.name == name)
}
