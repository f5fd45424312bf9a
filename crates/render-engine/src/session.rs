//! Render sessions.
//!
//! A [`RenderSession`] is owned by whoever drives rendering (the CLI, an
//! editor host) and is the single writer of the last-run state. Rerendering
//! reuses that state with a different quality.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use liveview_common::error::LiveviewError;
use liveview_scene_model::{
    find_scene, QualityTier, RenderRequest, RunConfig, SceneDescriptor, SceneScanner,
};

use crate::invoker::{RenderError, RenderInvoker, RenderOutcome};
use crate::sink::OutputSink;

/// Errors from session-level operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No Manim Scene classes found in {path}")]
    NoCandidateScenes { path: PathBuf },

    #[error("Scene \"{scene}\" not found in {path}")]
    SceneNotFound { scene: String, path: PathBuf },

    #[error("Multiple scenes found, choose one of: {}", .candidates.join(", "))]
    AmbiguousScene { candidates: Vec<String> },

    #[error("No scene has been run yet. Please run a Manim scene first.")]
    NoPreviousRun,

    #[error("Not a Python source file: {path}")]
    NotPythonSource { path: PathBuf },

    #[error(transparent)]
    Common(#[from] LiveviewError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Scene selection, rendering, and rerendering for one workspace.
#[derive(Debug)]
pub struct RenderSession {
    invoker: RenderInvoker,
    scanner: SceneScanner,
    workspace_dir: PathBuf,
    disable_cache: bool,
    state_file: Option<PathBuf>,
    last_run: Option<RunConfig>,
}

impl RenderSession {
    /// Session rendering with `invoker`, running the renderer inside `workspace_dir`.
    pub fn new(invoker: RenderInvoker, workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            invoker,
            scanner: SceneScanner::default(),
            workspace_dir: workspace_dir.into(),
            disable_cache: true,
            state_file: None,
            last_run: None,
        }
    }

    pub fn with_scanner(mut self, scanner: SceneScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Whether regular runs pass the cache-disable flag. Rerenders always do.
    pub fn with_cache_disabled(mut self, disable_cache: bool) -> Self {
        self.disable_cache = disable_cache;
        self
    }

    /// Persist the last run to `path` as JSON, loading any run already there.
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.last_run = load_state(&path);
        self.state_file = Some(path);
        self
    }

    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    pub fn invoker(&self) -> &RenderInvoker {
        &self.invoker
    }

    pub fn last_run(&self) -> Option<&RunConfig> {
        self.last_run.as_ref()
    }

    /// Forget the last run.
    pub fn clear(&mut self) {
        self.last_run = None;
        self.persist();
    }

    /// Scenes declared in `file`. Relative paths resolve against the workspace.
    pub fn scan(&self, file: &Path) -> Result<Vec<SceneDescriptor>, SessionError> {
        Ok(self.scanner.scan_file(&self.resolve(file))?)
    }

    /// Pick the scene to render from `file`.
    ///
    /// An explicit `requested` name must exist. Otherwise the last run's
    /// scene is reused when it came from the same file and still exists,
    /// then a lone scene is picked. Several candidates need a choice from
    /// the caller.
    pub fn select_scene(&self, file: &Path, requested: Option<&str>) -> Result<String, SessionError> {
        let path = self.resolve(file);
        let scenes = self.scanner.scan_file(&path)?;
        if scenes.is_empty() {
            return Err(SessionError::NoCandidateScenes { path });
        }

        if let Some(name) = requested {
            return find_scene(&scenes, name)
                .map(|scene| scene.name.clone())
                .ok_or_else(|| SessionError::SceneNotFound {
                    scene: name.to_string(),
                    path,
                });
        }

        if let Some(run) = &self.last_run {
            if run.source_file == path && find_scene(&scenes, &run.scene_name).is_some() {
                tracing::debug!(scene = %run.scene_name, "Reusing last scene");
                return Ok(run.scene_name.clone());
            }
        }

        if scenes.len() == 1 {
            return Ok(scenes[0].name.clone());
        }
        Err(SessionError::AmbiguousScene {
            candidates: scenes.into_iter().map(|s| s.name).collect(),
        })
    }

    /// Render `scene` from `file` and remember it as the last run.
    pub async fn run_scene(
        &mut self,
        file: &Path,
        scene: &str,
        quality: QualityTier,
        sink: Arc<dyn OutputSink>,
    ) -> Result<RenderOutcome, SessionError> {
        let path = self.resolve(file);
        if path.extension().and_then(|ext| ext.to_str()) != Some("py") {
            return Err(SessionError::NotPythonSource { path });
        }
        if !path.is_file() {
            return Err(LiveviewError::FileNotFound { path }.into());
        }
        self.require_scene(&path, scene)?;

        sink.append_line(&format!("Running Manim scene: {scene}"));
        sink.append_line(&format!("Quality: {quality}"));

        let run = RunConfig::new(&path, scene, quality);
        let request = run.to_request(self.disable_cache);
        self.last_run = Some(run);
        self.persist();

        self.render(request, sink).await
    }

    /// Render the last run's scene again at `quality`, always without cache.
    pub async fn rerender(
        &mut self,
        quality: QualityTier,
        sink: Arc<dyn OutputSink>,
    ) -> Result<RenderOutcome, SessionError> {
        let mut run = self.last_run.clone().ok_or(SessionError::NoPreviousRun)?;
        self.require_scene(&run.source_file, &run.scene_name)?;

        sink.append_line(&format!("Rerendering Manim scene: {}", run.scene_name));
        sink.append_line(&format!("Quality: {quality}"));
        sink.append_line(&format!("File: {}", run.source_file.display()));

        run.quality = quality;
        let request = run.to_request(true);
        self.last_run = Some(run);
        self.persist();

        self.render(request, sink).await
    }

    async fn render(
        &mut self,
        request: RenderRequest,
        sink: Arc<dyn OutputSink>,
    ) -> Result<RenderOutcome, SessionError> {
        let outcome = match self
            .invoker
            .run(&request, Arc::clone(&sink), &self.workspace_dir)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                sink.append_line(&format!("Error: {e}"));
                return Err(e.into());
            }
        };

        match &outcome {
            RenderOutcome::Ready(path) => {
                sink.append_line(&format!("Video rendered successfully: {}", path.display()));
            }
            RenderOutcome::NotFound => {
                sink.append_line("Failed to render video. Check the output for details.");
            }
            RenderOutcome::Cancelled => sink.append_line("Render cancelled."),
        }

        if let Some(run) = self.last_run.as_mut() {
            run.record_result(outcome.artifact().map(Path::to_path_buf));
        }
        self.persist();
        Ok(outcome)
    }

    fn require_scene(&self, path: &Path, scene: &str) -> Result<(), SessionError> {
        let scenes = self.scanner.scan_file(path)?;
        if find_scene(&scenes, scene).is_none() {
            return Err(SessionError::SceneNotFound {
                scene: scene.to_string(),
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.workspace_dir.join(file)
        }
    }

    fn persist(&self) {
        let Some(path) = &self.state_file else {
            return;
        };
        if let Err(e) = save_state(path, self.last_run.as_ref()) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to save session state");
        }
    }
}

fn load_state(path: &Path) -> Option<RunConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Failed to read session state at {:?}: {}", path, e);
            return None;
        }
    };
    match serde_json::from_str::<Option<RunConfig>>(&content) {
        Ok(run) => run,
        Err(e) => {
            tracing::warn!("Failed to parse session state at {:?}: {}", path, e);
            None
        }
    }
}

fn save_state(path: &Path, run: Option<&RunConfig>) -> Result<(), LiveviewError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&run)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    const TWO_SCENES: &str = "class Intro(Scene):\n    pass\n\nclass Outro(Scene):\n    pass\n";

    fn workspace(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("scenes.py");
        std::fs::write(&file, contents).unwrap();
        (dir, file)
    }

    fn session(dir: &Path) -> RenderSession {
        RenderSession::new(RenderInvoker::new(dir.join("media")), dir)
    }

    #[test]
    fn test_select_requested_scene() {
        let (dir, file) = workspace(TWO_SCENES);
        let session = session(dir.path());
        assert_eq!(session.select_scene(&file, Some("Outro")).unwrap(), "Outro");

        let err = session.select_scene(&file, Some("Missing")).unwrap_err();
        assert!(matches!(err, SessionError::SceneNotFound { ref scene, .. } if scene == "Missing"));
    }

    #[test]
    fn test_select_requires_choice_between_many() {
        let (dir, file) = workspace(TWO_SCENES);
        let err = session(dir.path()).select_scene(&file, None).unwrap_err();
        match err {
            SessionError::AmbiguousScene { candidates } => {
                assert_eq!(candidates, vec!["Intro", "Outro"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_select_single_scene_and_relative_path() {
        let (dir, _) = workspace("class Only(ThreeDScene):\n");
        let session = session(dir.path());
        assert_eq!(
            session.select_scene(Path::new("scenes.py"), None).unwrap(),
            "Only"
        );
    }

    #[test]
    fn test_select_reuses_last_run_for_same_file() {
        let (dir, file) = workspace(TWO_SCENES);
        let mut session = session(dir.path());
        session.last_run = Some(RunConfig::new(&file, "Outro", QualityTier::High));
        assert_eq!(session.select_scene(&file, None).unwrap(), "Outro");

        session.last_run = Some(RunConfig::new(&file, "Renamed", QualityTier::High));
        assert!(matches!(
            session.select_scene(&file, None),
            Err(SessionError::AmbiguousScene { .. })
        ));
    }

    #[test]
    fn test_select_no_scenes() {
        let (dir, file) = workspace("print('hello')\n");
        assert!(matches!(
            session(dir.path()).select_scene(&file, None),
            Err(SessionError::NoCandidateScenes { .. })
        ));
        assert!(matches!(
            session(dir.path()).select_scene(&dir.path().join("absent.py"), None),
            Err(SessionError::NoCandidateScenes { .. })
        ));
    }

    #[tokio::test]
    async fn test_rerender_without_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let sink = Arc::new(MemorySink::new());
        let err = session
            .rerender(QualityTier::High, sink.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoPreviousRun));
        assert!(sink.contents().is_empty());
    }

    #[tokio::test]
    async fn test_run_rejects_non_python_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "class A(Scene):\n").unwrap();

        let mut session = session(dir.path());
        let err = session
            .run_scene(&file, "A", QualityTier::Low, Arc::new(MemorySink::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotPythonSource { .. }));
        assert!(session.last_run().is_none());
    }

    #[tokio::test]
    async fn test_run_rejects_unknown_scene_before_spawning() {
        let (dir, file) = workspace(TWO_SCENES);
        let mut session = session(dir.path());
        let sink = Arc::new(MemorySink::new());
        let err = session
            .run_scene(&file, "Nope", QualityTier::Low, sink.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::SceneNotFound { .. }));
        assert!(!sink.contents().contains("Running:"));
    }

    #[tokio::test]
    async fn test_rerender_requires_scene_to_still_exist() {
        let (dir, file) = workspace(TWO_SCENES);
        let mut session = session(dir.path());
        session.last_run = Some(RunConfig::new(&file, "Intro", QualityTier::Low));
        std::fs::write(&file, "class Renamed(Scene):\n").unwrap();

        let err = session
            .rerender(QualityTier::High, Arc::new(MemorySink::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::SceneNotFound { ref scene, .. } if scene == "Intro"));
        assert_eq!(session.last_run().unwrap().quality, QualityTier::Low);
    }

    #[test]
    fn test_state_file_round_trip() {
        let (dir, file) = workspace(TWO_SCENES);
        let state = dir.path().join(".manim-liveview").join("last_run.json");

        let mut first = session(dir.path()).with_state_file(&state);
        assert!(first.last_run().is_none());
        first.last_run = Some(RunConfig::new(&file, "Intro", QualityTier::Medium));
        first.persist();

        let second = session(dir.path()).with_state_file(&state);
        let run = second.last_run().unwrap();
        assert_eq!(run.scene_name, "Intro");
        assert_eq!(run.quality, QualityTier::Medium);

        let mut third = second;
        third.clear();
        assert!(session(dir.path())
            .with_state_file(&state)
            .last_run()
            .is_none());
    }

    #[test]
    fn test_corrupt_state_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("last_run.json");
        std::fs::write(&state, "{ broken").unwrap();
        assert!(session(dir.path())
            .with_state_file(&state)
            .last_run()
            .is_none());
    }
}
