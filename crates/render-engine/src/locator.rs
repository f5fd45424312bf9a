//! Finding the video a finished render produced.
//!
//! The renderer writes `<output_root>/videos/<file stem>/<quality dir>/<Scene>.mp4`.
//! [`locate`] walks `videos/` looking for that file; when the layout is
//! unexpected, [`locate_in_output`] falls back to paths printed by the
//! renderer itself.

use std::path::{Path, PathBuf};

use liveview_scene_model::QualityTier;
use once_cell::sync::Lazy;
use regex::Regex;

/// Extension of rendered videos.
pub const ARTIFACT_EXTENSION: &str = "mp4";

/// Subdirectory of the output root that holds videos.
pub const VIDEOS_DIR: &str = "videos";

static FILE_READY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"File ready at (.+\.mp4)").expect("file-ready pattern is valid"));

static MP4_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([/\w\-~.]+/[\w\-]+\.mp4)").expect("mp4 path pattern is valid"));

/// How well a candidate matches the requested quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    /// Directly inside a directory named after the quality.
    Exact,
    /// Somewhere below a directory whose relative path mentions the quality.
    Nested,
}

/// A file that could be the rendered artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub path: PathBuf,
    pub rank: MatchRank,
}

/// `<scene>.mp4`
pub fn artifact_file_name(scene_name: &str) -> String {
    format!("{scene_name}.{ARTIFACT_EXTENSION}")
}

/// Every matching file under `<output_root>/videos`, in traversal order.
///
/// Traversal is depth-first with each directory's entries sorted by name,
/// so the order does not depend on the platform. Symlinked directories are
/// not followed and unreadable directories are skipped.
pub fn find_candidates(
    output_root: &Path,
    scene_name: &str,
    quality: QualityTier,
) -> Vec<ArtifactCandidate> {
    let videos_dir = output_root.join(VIDEOS_DIR);
    if !videos_dir.is_dir() {
        tracing::debug!(dir = %videos_dir.display(), "No videos directory");
        return Vec::new();
    }

    let target = artifact_file_name(scene_name);
    let quality_dir = quality.directory();
    let mut candidates = Vec::new();
    let mut stack = vec![videos_dir.clone()];

    while let Some(dir) = stack.pop() {
        let mut entries = match std::fs::read_dir(&dir) {
            Ok(read) => read.filter_map(Result::ok).collect::<Vec<_>>(),
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };
        entries.sort_by_key(|entry| entry.file_name());

        // Subdirectories are pushed in reverse so the first one is searched next.
        let mut subdirs = Vec::new();
        for entry in entries {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            if file_type.is_dir() {
                subdirs.push(path);
                continue;
            }
            if entry.file_name().to_str() != Some(target.as_str()) || !path.is_file() {
                continue;
            }
            if let Some(rank) = rank_candidate(&videos_dir, &dir, quality_dir) {
                tracing::debug!(path = %path.display(), ?rank, "Artifact candidate");
                candidates.push(ArtifactCandidate { path, rank });
            }
        }
        stack.extend(subdirs.into_iter().rev());
    }

    candidates
}

fn rank_candidate(videos_dir: &Path, parent: &Path, quality_dir: &str) -> Option<MatchRank> {
    if parent.file_name().and_then(|n| n.to_str()) == Some(quality_dir) {
        return Some(MatchRank::Exact);
    }
    let relative = parent.strip_prefix(videos_dir).ok()?;
    relative
        .to_string_lossy()
        .contains(quality_dir)
        .then_some(MatchRank::Nested)
}

/// Locate the rendered video for `scene_name` at `quality`.
///
/// Exact matches win over nested ones; within a rank the first file in
/// traversal order wins. Returns `None` when the output root or its
/// `videos` directory is missing.
pub fn locate(output_root: &Path, scene_name: &str, quality: QualityTier) -> Option<PathBuf> {
    let found = find_candidates(output_root, scene_name, quality)
        .into_iter()
        .min_by_key(|candidate| candidate.rank)
        .map(|candidate| candidate.path);

    match &found {
        Some(path) => tracing::info!(path = %path.display(), "Located rendered video"),
        None => tracing::debug!(
            root = %output_root.display(),
            scene = scene_name,
            quality = quality.directory(),
            "No rendered video in output tree"
        ),
    }
    found
}

/// Find a video path announced in renderer output.
///
/// Prefers a `File ready at <path>.mp4` line, then any path-like token
/// ending in `.mp4`. Relative paths resolve against `working_dir`. Only
/// paths that exist on disk are returned.
pub fn locate_in_output(output: &str, working_dir: &Path) -> Option<PathBuf> {
    if let Some(raw) = FILE_READY.captures(output).and_then(|caps| caps.get(1)) {
        let raw = raw
            .as_str()
            .trim_matches(|c: char| c == '\'' || c == '"' || c.is_whitespace());
        if let Some(path) = existing_file(raw, working_dir) {
            tracing::debug!(path = %path.display(), "Video path from file-ready line");
            return Some(path);
        }
    }

    let found = MP4_PATH
        .captures_iter(output)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| existing_file(m.as_str(), working_dir));
    if let Some(path) = &found {
        tracing::debug!(path = %path.display(), "Video path from renderer output");
    }
    found
}

fn existing_file(raw: &str, working_dir: &Path) -> Option<PathBuf> {
    if raw.is_empty() {
        return None;
    }
    let path = working_dir.join(raw);
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"video").unwrap();
    }

    #[test]
    fn test_exact_quality_directory() {
        let root = tempfile::tempdir().unwrap();
        let video = root.path().join("videos/720p30/MyScene.mp4");
        touch(&video);

        assert_eq!(
            locate(root.path(), "MyScene", QualityTier::Medium),
            Some(video)
        );
        assert_eq!(locate(root.path(), "MyScene", QualityTier::High), None);
    }

    #[test]
    fn test_renderer_layout_with_file_stem() {
        let root = tempfile::tempdir().unwrap();
        let video = root.path().join("videos/scenes/1080p60/Intro.mp4");
        touch(&video);
        touch(&root.path().join("videos/scenes/480p15/Intro.mp4"));

        assert_eq!(locate(root.path(), "Intro", QualityTier::High), Some(video));
    }

    #[test]
    fn test_missing_roots() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(
            locate(&root.path().join("absent"), "A", QualityTier::Low),
            None
        );
        assert_eq!(locate(root.path(), "A", QualityTier::Low), None);
    }

    #[test]
    fn test_exact_beats_nested_regardless_of_order() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("videos/a/480p15/partial/A.mp4");
        let exact = root.path().join("videos/z/480p15/A.mp4");
        touch(&nested);
        touch(&exact);

        let candidates = find_candidates(root.path(), "A", QualityTier::Low);
        assert_eq!(
            candidates,
            vec![
                ArtifactCandidate {
                    path: nested,
                    rank: MatchRank::Nested
                },
                ArtifactCandidate {
                    path: exact.clone(),
                    rank: MatchRank::Exact
                },
            ]
        );
        assert_eq!(locate(root.path(), "A", QualityTier::Low), Some(exact));
    }

    #[test]
    fn test_first_in_sorted_order_wins_within_rank() {
        let root = tempfile::tempdir().unwrap();
        let first = root.path().join("videos/alpha/720p30/A.mp4");
        touch(&root.path().join("videos/beta/720p30/A.mp4"));
        touch(&first);

        assert_eq!(locate(root.path(), "A", QualityTier::Medium), Some(first));
    }

    #[test]
    fn test_quality_in_output_root_does_not_count() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("1080p60");
        touch(&root.join("videos/other/A.mp4"));

        assert_eq!(locate(&root, "A", QualityTier::High), None);
    }

    #[test]
    fn test_other_scene_names_are_ignored() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("videos/720p30/MySceneExtra.mp4"));
        touch(&root.path().join("videos/720p30/MyScene.mov"));

        assert_eq!(locate(root.path(), "MyScene", QualityTier::Medium), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_not_followed() {
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("720p30");
        touch(&target.join("A.mp4"));
        std::fs::create_dir_all(root.path().join("videos")).unwrap();
        std::os::unix::fs::symlink(&target, root.path().join("videos/link")).unwrap();

        assert!(find_candidates(root.path(), "A", QualityTier::Medium).is_empty());
        assert_eq!(locate(root.path(), "A", QualityTier::Medium), None);

        let real = root.path().join("videos/scenes/720p30/A.mp4");
        touch(&real);
        assert_eq!(locate(root.path(), "A", QualityTier::Medium), Some(real));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let video = root.path().join("videos/b/720p30/A.mp4");
        touch(&video);
        let locked = root.path().join("videos/a");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let found = locate(root.path(), "A", QualityTier::Medium);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(found, Some(video));
    }

    #[test]
    fn test_file_ready_line() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("out/Intro.mp4");
        touch(&video);

        let output = format!("INFO     File ready at '{}'\n", video.display());
        assert_eq!(locate_in_output(&output, dir.path()), Some(video));
    }

    #[test]
    fn test_relative_path_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("media/videos/s/480p15/Intro.mp4");
        touch(&video);

        let output = "Animation 0: done\nwrote media/videos/s/480p15/Intro.mp4\n";
        assert_eq!(locate_in_output(output, dir.path()), Some(video));
    }

    #[test]
    fn test_later_existing_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("b/Real.mp4");
        touch(&video);

        let output = format!("/nowhere/Ghost.mp4\n{}\n", video.display());
        assert_eq!(locate_in_output(&output, dir.path()), Some(video));
    }

    #[test]
    fn test_no_path_in_output() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(locate_in_output("", dir.path()), None);
        assert_eq!(
            locate_in_output("File ready at /nowhere/Ghost.mp4", dir.path()),
            None
        );
    }
}
